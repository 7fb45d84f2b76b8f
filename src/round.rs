use crate::error::MarketError;
use crate::market::{MarketGraph, NodeKey};
use crate::solution::{Amount, BestResponse};
use anyhow;
use anyhow::{ensure, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::trace;

/// buyer -> [(seller, payoff)] in the insertion order of the buyer's valuation edges
pub type PayoffMap<K, V> = BTreeMap<K, Vec<(K, V)>>;
/// buyer -> seller maximizing the buyer's payoff
pub type BestResponseMap<K, V> = BTreeMap<K, BestResponse<K, V>>;
/// best responses of the round in which no seller is over-demanded
pub type FinalAssignment<K, V> = BestResponseMap<K, V>;

/// Rule picking a seller among several that give a buyer the same maximal payoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// first seller in the order the buyer's valuation edges were added
    EdgeOrder,
    /// seller with the smallest key
    LowestSellerKey,
}

impl Default for TieBreak {
    fn default() -> Self {
        TieBreak::EdgeOrder
    }
}

/// Computes payoff = valuation - price for every valuation edge at current prices.
///
/// Buyers without edges have no demand and are omitted. Payoffs are not clamped, a
/// negative payoff is a valid option.
pub fn get_payoff<K: NodeKey, V: Amount>(market: &MarketGraph<K, V>) -> PayoffMap<K, V> {
    let mut payoffs = BTreeMap::new();
    for (buyer_idx, buyer) in market.buyers().iter().enumerate() {
        let options = market
            .buyer_options(buyer_idx)
            .map(|(seller, valuation, price)| (seller.clone(), valuation - price))
            .collect::<Vec<_>>();
        if options.is_empty() {
            continue;
        }
        payoffs.insert(buyer.clone(), options);
    }
    trace!("payoffs {:?}", payoffs);
    payoffs
}

/// Reduces every buyer's options to the one with the maximal payoff.
pub fn get_best_payoffs<K: NodeKey, V: Amount>(
    payoffs: &PayoffMap<K, V>,
    tie_break: TieBreak,
) -> BestResponseMap<K, V> {
    let mut best = BTreeMap::new();
    for (buyer, options) in payoffs.iter() {
        let mut options_iter = options.iter();
        let (mut best_seller, mut max_payoff) = match options_iter.next() {
            Some((seller, payoff)) => (seller, *payoff),
            None => continue,
        };
        for (seller, payoff) in options_iter {
            let better = *payoff > max_payoff
                || (tie_break == TieBreak::LowestSellerKey
                    && *payoff == max_payoff
                    && seller < best_seller);
            if better {
                best_seller = seller;
                max_payoff = *payoff;
            }
        }
        best.insert(
            buyer.clone(),
            BestResponse {
                seller: best_seller.clone(),
                payoff: max_payoff,
            },
        );
    }
    trace!("best responses {:?}", best);
    best
}

/// Sellers chosen by two or more buyers.
///
/// The market is cleared exactly when the returned set is empty.
pub fn find_constrained_set<K: NodeKey, V>(best: &BestResponseMap<K, V>) -> BTreeSet<K> {
    let mut demand: HashMap<&K, u32> = HashMap::with_capacity(best.len());
    for response in best.values() {
        *demand.entry(&response.seller).or_insert(0) += 1;
    }
    demand
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(seller, _)| seller.clone())
        .collect()
}

/// Raises the price of every constrained seller by `increment`.
///
/// Either every listed seller gets the increment or, on error, none does.
pub fn adjust_seller_price<K: NodeKey, V: Amount>(
    market: &mut MarketGraph<K, V>,
    constrained: &BTreeSet<K>,
    increment: V,
) -> Result<(), anyhow::Error> {
    ensure!(
        increment > V::zero(),
        MarketError::NonPositiveIncrement(format!("{}", increment))
    );
    for seller in constrained.iter() {
        ensure!(
            market.is_seller(seller),
            MarketError::UnknownSeller(format!("{:?}", seller))
        );
    }
    for seller in constrained.iter() {
        market.raise_price(seller, increment)?;
    }
    Ok(())
}
