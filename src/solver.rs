use crate::error::MarketError;
use crate::market::{MarketGraph, NodeKey};
use crate::round::{
    adjust_seller_price, find_constrained_set, get_best_payoffs, get_payoff, BestResponseMap,
    TieBreak,
};
use crate::solution::{Amount, AuctionOutcome};
use anyhow;
use anyhow::{bail, ensure, Result};
use tracing::{debug, info, trace};

/// Hook invoked after the best responses of every round are known and before prices are
/// adjusted.
///
/// Implemented for closures `FnMut(round, &market, &best_responses)`.
pub trait RoundObserver<K, V> {
    fn on_round(&mut self, round: u32, market: &MarketGraph<K, V>, best: &BestResponseMap<K, V>);
}

impl<K, V, F> RoundObserver<K, V> for F
where
    F: FnMut(u32, &MarketGraph<K, V>, &BestResponseMap<K, V>),
{
    #[inline]
    fn on_round(&mut self, round: u32, market: &MarketGraph<K, V>, best: &BestResponseMap<K, V>) {
        self(round, market, best)
    }
}

/// Round counter of the uncapped loop stays at `u32::MAX` instead of overflowing.
#[inline]
fn next_round(rounds: u32) -> u32 {
    rounds.saturating_add(1)
}

/// Runs the ascending auction until no seller is over-demanded.
///
/// There is no round cap: a market that never clears keeps the loop running. Use
/// [`run_auction_with_params`] with `max_rounds` when termination must be guaranteed.
#[inline]
pub fn run_auction<K: NodeKey, V: Amount>(
    market: &mut MarketGraph<K, V>,
    price_increment: V,
) -> Result<AuctionOutcome<K, V>, anyhow::Error> {
    run_auction_with_params(market, price_increment, None, None, None)
}

/// Runs the ascending auction with an explicit tie-break rule, round cap and observer.
///
/// Every round evaluates payoffs at current prices, picks each buyer's best seller and
/// raises the price of every seller picked by more than one buyer by `price_increment`.
/// The auction ends on the first round without over-demanded sellers and returns that
/// round's best responses.
///
/// When `max_rounds` is given and the market is still over-demanded after that many
/// rounds, [`MarketError::NotConverged`] is returned and prices stay as they were in the
/// last evaluated round.
pub fn run_auction_with_params<K: NodeKey, V: Amount>(
    market: &mut MarketGraph<K, V>,
    price_increment: V,
    tie_break: Option<TieBreak>,
    max_rounds: Option<u32>,
    mut observer: Option<&mut dyn RoundObserver<K, V>>,
) -> Result<AuctionOutcome<K, V>, anyhow::Error> {
    ensure!(
        price_increment > V::zero(),
        MarketError::NonPositiveIncrement(format!("{}", price_increment))
    );
    let tie_break = tie_break.unwrap_or_default();

    let mut rounds = 0;
    loop {
        let payoffs = get_payoff(market);
        let best = get_best_payoffs(&payoffs, tie_break);
        rounds = next_round(rounds);

        if let Some(observer) = observer.as_mut() {
            observer.on_round(rounds, market, &best);
        }

        let constrained = find_constrained_set(&best);
        if constrained.is_empty() {
            info!("market cleared after {} rounds", rounds);
            trace!("prices: {:?}", market.prices());
            return Ok(AuctionOutcome {
                assignment: best,
                rounds,
            });
        }

        if let Some(limit) = max_rounds {
            if rounds >= limit {
                info!(
                    "market still over-demanded after {} rounds: {:?}",
                    rounds, constrained
                );
                bail!(MarketError::NotConverged { rounds });
            }
        }

        debug!("round {}: constrained sellers {:?}", rounds, constrained);
        adjust_seller_price(market, &constrained, price_increment)?;
    }
}
