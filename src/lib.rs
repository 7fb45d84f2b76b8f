//! Walrasian equilibrium prices for one-sided assignment markets.
//!
//! Every seller offers one indivisible item at a price, every buyer values a subset of the
//! items. The ascending auction repeatedly lets each buyer pick the seller maximizing
//! `valuation - price` and raises the price of every seller picked by more than one buyer,
//! until each seller is wanted by at most one buyer.
//!
//! ```
//! use assignment_market::{build_market, run_auction, Seller, ValuationEdge};
//!
//! let mut market = build_market(
//!     vec![Seller::new("s1", 0), Seller::new("s2", 0)],
//!     vec!["b1", "b2"],
//!     vec![
//!         ValuationEdge::new("s1", "b1", 10),
//!         ValuationEdge::new("s2", "b1", 8),
//!         ValuationEdge::new("s2", "b2", 7),
//!         ValuationEdge::new("s1", "b2", 9),
//!     ],
//! )
//! .unwrap();
//!
//! let outcome = run_auction(&mut market, 1).unwrap();
//! assert_eq!(outcome.seller_of(&"b1"), Some(&"s1"));
//! assert_eq!(outcome.seller_of(&"b2"), Some(&"s2"));
//! assert_eq!(market.price(&"s1"), Some(2));
//! ```
pub mod error;
pub mod market;
pub mod round;
pub mod solution;
pub mod solver;

pub use error::MarketError;
pub use market::{build_market, MarketGraph, NodeKey, Seller, ValuationEdge};
pub use round::{
    adjust_seller_price, find_constrained_set, get_best_payoffs, get_payoff, BestResponseMap,
    FinalAssignment, PayoffMap, TieBreak,
};
pub use solution::{Amount, AuctionOutcome, BestResponse};
pub use solver::{run_auction, run_auction_with_params, RoundObserver};
