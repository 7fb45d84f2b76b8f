use crate::market::{MarketGraph, NodeKey};
use crate::round::{get_payoff, FinalAssignment};
use num_traits::{Num, NumAssign, Signed};
use std::collections::HashSet;
use std::fmt::{Debug, Display};

/// Numeric domain of prices, valuations and payoffs.
///
/// Signed integers and floats qualify; payoffs are computed in the same domain as the
/// valuation and price they are derived from and go negative once a price exceeds a
/// valuation.
pub trait Amount: Num + NumAssign + Signed + Copy + PartialOrd + Debug + Display {}

impl<T> Amount for T where T: Num + NumAssign + Signed + Copy + PartialOrd + Debug + Display {}

/// Seller picked by a buyer in one round together with the payoff it yields.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResponse<K, V> {
    pub seller: K,
    pub payoff: V,
}

///
/// Outcome of an auction that cleared the market
///
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionOutcome<K, V> {
    /// buyer -> (seller, realised payoff) of the round in which no seller was over-demanded
    ///
    /// Buyers without valuation edges have no demand and are absent.
    pub assignment: FinalAssignment<K, V>,
    /// number of payoff evaluation passes, including the final one
    pub rounds: u32,
}

impl<K: NodeKey, V: Amount> AuctionOutcome<K, V> {
    pub fn seller_of(&self, buyer: &K) -> Option<&K> {
        self.assignment.get(buyer).map(|response| &response.seller)
    }

    /// Sum of the payoffs realised by assigned buyers.
    pub fn total_payoff(&self) -> V {
        self.assignment
            .values()
            .fold(V::zero(), |acc, response| acc + response.payoff)
    }

    /// Sum of valuations over the assigned edges.
    pub fn welfare(&self, market: &MarketGraph<K, V>) -> V {
        self.assignment
            .iter()
            .filter_map(|(buyer, response)| market.valuation(&response.seller, buyer))
            .fold(V::zero(), |acc, value| acc + value)
    }

    /// Sum of current prices of assigned sellers.
    pub fn revenue(&self, market: &MarketGraph<K, V>) -> V {
        self.assignment
            .values()
            .filter_map(|response| market.price(&response.seller))
            .fold(V::zero(), |acc, price| acc + price)
    }

    /// Buyers of the market that are missing from the assignment.
    pub fn unassigned_buyers<'a>(&self, market: &'a MarketGraph<K, V>) -> Vec<&'a K> {
        market
            .buyers()
            .iter()
            .filter(|buyer| !self.assignment.contains_key(*buyer))
            .collect()
    }

    /// Checks the equilibrium condition against current market prices.
    ///
    /// Every buyer with demand is assigned, its assigned seller gives a payoff at least as
    /// high as any other seller it values, and no seller is assigned twice.
    pub fn is_equilibrium(&self, market: &MarketGraph<K, V>) -> bool {
        let payoffs = get_payoff(market);
        if payoffs.len() != self.assignment.len() {
            return false;
        }

        let mut taken = HashSet::with_capacity(self.assignment.len());
        for (buyer, options) in payoffs.iter() {
            let response = match self.assignment.get(buyer) {
                Some(response) => response,
                None => return false,
            };
            if !taken.insert(&response.seller) {
                return false;
            }
            let chosen = match options
                .iter()
                .find(|(seller, _)| *seller == response.seller)
            {
                Some((_, payoff)) => *payoff,
                None => return false,
            };
            if options.iter().any(|(_, payoff)| *payoff > chosen) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{AuctionOutcome, BestResponse};
    use crate::market::{build_market, MarketGraph, Seller, ValuationEdge};
    use std::collections::BTreeMap;

    fn market() -> MarketGraph<&'static str, i64> {
        build_market(
            vec![Seller::new("s1", 3), Seller::new("s2", 1)],
            vec!["b1", "b2", "b3"],
            vec![
                ValuationEdge::new("s1", "b1", 10),
                ValuationEdge::new("s2", "b1", 6),
                ValuationEdge::new("s1", "b2", 4),
                ValuationEdge::new("s2", "b2", 5),
            ],
        )
        .unwrap()
    }

    fn outcome(pairs: &[(&'static str, &'static str, i64)]) -> AuctionOutcome<&'static str, i64> {
        let assignment = pairs
            .iter()
            .map(|&(buyer, seller, payoff)| (buyer, BestResponse { seller, payoff }))
            .collect::<BTreeMap<_, _>>();
        AuctionOutcome {
            assignment,
            rounds: 1,
        }
    }

    #[test]
    fn test_totals() {
        let market = market();
        let outcome = outcome(&[("b1", "s1", 7), ("b2", "s2", 4)]);
        assert_eq!(outcome.total_payoff(), 11);
        assert_eq!(outcome.welfare(&market), 15);
        assert_eq!(outcome.revenue(&market), 4);
        assert_eq!(outcome.seller_of(&"b2"), Some(&"s2"));
        assert_eq!(outcome.unassigned_buyers(&market), vec![&"b3"]);
    }

    #[test]
    fn test_is_equilibrium() {
        let market = market();
        assert!(outcome(&[("b1", "s1", 7), ("b2", "s2", 4)]).is_equilibrium(&market));
        // b2 prefers s2 at these prices
        assert!(!outcome(&[("b1", "s2", 5), ("b2", "s1", 1)]).is_equilibrium(&market));
        // s1 assigned twice
        assert!(!outcome(&[("b1", "s1", 7), ("b2", "s1", 1)]).is_equilibrium(&market));
        // b2 has demand but no seller
        assert!(!outcome(&[("b1", "s1", 7)]).is_equilibrium(&market));
    }
}
