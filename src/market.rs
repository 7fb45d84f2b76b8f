use crate::error::MarketError;
use crate::solution::Amount;
use anyhow;
use anyhow::{ensure, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;

/// Identity of a seller or a buyer.
pub trait NodeKey: Clone + Eq + Hash + Ord + Debug {}

impl<T> NodeKey for T where T: Clone + Eq + Hash + Ord + Debug {}

/// Seller declaration used by [`build_market`]. The price is required.
#[derive(Debug, Clone, PartialEq)]
pub struct Seller<K, V> {
    pub key: K,
    pub price: Option<V>,
}

impl<K, V> Seller<K, V> {
    pub fn new(key: K, price: V) -> Self {
        Self {
            key,
            price: Some(price),
        }
    }
}

/// Valuation edge declaration used by [`build_market`].
///
/// Endpoints may be given in either order, one of them must be a seller and the other a
/// buyer. The valuation is required.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationEdge<K, V> {
    pub from: K,
    pub to: K,
    pub valuation: Option<V>,
}

impl<K, V> ValuationEdge<K, V> {
    pub fn new(from: K, to: K, valuation: V) -> Self {
        Self {
            from,
            to,
            valuation: Some(valuation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Seller(usize),
    Buyer(usize),
}

/// Bipartite valuation graph of sellers and buyers.
///
/// Keys and edges are fixed once added, seller prices are the only state that changes
/// during an auction.
#[derive(Debug, Clone)]
pub struct MarketGraph<K, V> {
    sellers: Vec<K>,
    buyers: Vec<K>,
    seller_indices: HashMap<K, usize>,
    buyer_indices: HashMap<K, usize>,
    // edges in insertion order
    edge_sellers: Vec<usize>,
    edge_buyers: Vec<usize>,
    values: Vec<V>,
    // edge indices incident to each buyer, in insertion order
    buyer_edges: Vec<Vec<usize>>,
    prices: Vec<V>,
}

impl<K: NodeKey, V: Amount> Default for MarketGraph<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey, V: Amount> MarketGraph<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(0, 0, 0)
    }

    pub fn with_capacity(
        seller_capacity: usize,
        buyer_capacity: usize,
        edges_capacity: usize,
    ) -> Self {
        Self {
            sellers: Vec::with_capacity(seller_capacity),
            buyers: Vec::with_capacity(buyer_capacity),
            seller_indices: HashMap::with_capacity(seller_capacity),
            buyer_indices: HashMap::with_capacity(buyer_capacity),
            edge_sellers: Vec::with_capacity(edges_capacity),
            edge_buyers: Vec::with_capacity(edges_capacity),
            values: Vec::with_capacity(edges_capacity),
            buyer_edges: Vec::with_capacity(buyer_capacity),
            prices: Vec::with_capacity(seller_capacity),
        }
    }

    pub fn add_seller(&mut self, key: K, price: V) -> Result<(), anyhow::Error> {
        ensure!(
            is_comparable(&price),
            MarketError::InvalidAmount(format!("{}", price))
        );
        self.ensure_new_node(&key)?;
        self.seller_indices.insert(key.clone(), self.sellers.len());
        self.sellers.push(key);
        self.prices.push(price);
        Ok(())
    }

    pub fn add_buyer(&mut self, key: K) -> Result<(), anyhow::Error> {
        self.ensure_new_node(&key)?;
        self.buyer_indices.insert(key.clone(), self.buyers.len());
        self.buyers.push(key);
        self.buyer_edges.push(Vec::new());
        Ok(())
    }

    /// Adds the valuation a buyer has for a seller's item.
    ///
    /// `from` and `to` may name the seller and the buyer in either order.
    pub fn add_valuation(&mut self, from: K, to: K, valuation: V) -> Result<(), anyhow::Error> {
        let (seller, buyer) = self.resolve_edge(&from, &to)?;
        self.push_edge(seller, buyer, valuation)
    }

    fn push_edge(
        &mut self,
        seller: usize,
        buyer: usize,
        valuation: V,
    ) -> Result<(), anyhow::Error> {
        ensure!(
            is_comparable(&valuation),
            MarketError::InvalidAmount(format!("{}", valuation))
        );
        let edge_sellers = &self.edge_sellers;
        ensure!(
            !self.buyer_edges[buyer]
                .iter()
                .any(|&edge| edge_sellers[edge] == seller),
            MarketError::DuplicateEdge {
                seller: format!("{:?}", self.sellers[seller]),
                buyer: format!("{:?}", self.buyers[buyer]),
            }
        );

        self.buyer_edges[buyer].push(self.values.len());
        self.edge_sellers.push(seller);
        self.edge_buyers.push(buyer);
        self.values.push(valuation);
        Ok(())
    }

    fn ensure_new_node(&self, key: &K) -> Result<(), anyhow::Error> {
        ensure!(
            !self.seller_indices.contains_key(key) && !self.buyer_indices.contains_key(key),
            MarketError::DuplicateNode(format!("{:?}", key))
        );
        Ok(())
    }

    fn side(&self, key: &K) -> Result<Side, anyhow::Error> {
        if let Some(&seller) = self.seller_indices.get(key) {
            Ok(Side::Seller(seller))
        } else if let Some(&buyer) = self.buyer_indices.get(key) {
            Ok(Side::Buyer(buyer))
        } else {
            Err(MarketError::UnknownNode(format!("{:?}", key)).into())
        }
    }

    /// Returns (seller index, buyer index) of an edge given in any orientation.
    fn resolve_edge(&self, from: &K, to: &K) -> Result<(usize, usize), anyhow::Error> {
        match (self.side(from)?, self.side(to)?) {
            (Side::Seller(seller), Side::Buyer(buyer))
            | (Side::Buyer(buyer), Side::Seller(seller)) => Ok((seller, buyer)),
            (Side::Seller(_), Side::Seller(_)) => Err(MarketError::NotBipartite {
                left: format!("{:?}", from),
                right: format!("{:?}", to),
                side: "sellers",
            }
            .into()),
            (Side::Buyer(_), Side::Buyer(_)) => Err(MarketError::NotBipartite {
                left: format!("{:?}", from),
                right: format!("{:?}", to),
                side: "buyers",
            }
            .into()),
        }
    }

    /// Raises the price of `seller` by `increment`. The only mutation of a built market.
    pub fn raise_price(&mut self, seller: &K, increment: V) -> Result<(), anyhow::Error> {
        ensure!(
            increment > V::zero(),
            MarketError::NonPositiveIncrement(format!("{}", increment))
        );
        let idx = *self
            .seller_indices
            .get(seller)
            .ok_or_else(|| MarketError::UnknownSeller(format!("{:?}", seller)))?;
        self.prices[idx] += increment;
        trace!("price of {:?} raised to {}", seller, self.prices[idx]);
        Ok(())
    }

    #[inline]
    pub fn sellers(&self) -> &[K] {
        &self.sellers
    }

    #[inline]
    pub fn buyers(&self) -> &[K] {
        &self.buyers
    }

    #[inline]
    pub fn num_sellers(&self) -> usize {
        self.sellers.len()
    }

    #[inline]
    pub fn num_buyers(&self) -> usize {
        self.buyers.len()
    }

    #[inline]
    pub fn num_of_edges(&self) -> usize {
        self.values.len()
    }

    pub fn is_seller(&self, key: &K) -> bool {
        self.seller_indices.contains_key(key)
    }

    pub fn price(&self, seller: &K) -> Option<V> {
        self.seller_indices
            .get(seller)
            .map(|&idx| self.prices[idx])
    }

    /// Snapshot of current prices keyed by seller.
    pub fn prices(&self) -> BTreeMap<K, V> {
        self.sellers
            .iter()
            .cloned()
            .zip(self.prices.iter().copied())
            .collect()
    }

    pub fn valuation(&self, seller: &K, buyer: &K) -> Option<V> {
        let seller = *self.seller_indices.get(seller)?;
        let buyer = *self.buyer_indices.get(buyer)?;
        self.buyer_edges[buyer]
            .iter()
            .find(|&&edge| self.edge_sellers[edge] == seller)
            .map(|&edge| self.values[edge])
    }

    /// All valuation edges as (seller, buyer, valuation), in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&K, &K, V)> + '_ {
        self.values.iter().enumerate().map(move |(edge, &value)| {
            (
                &self.sellers[self.edge_sellers[edge]],
                &self.buyers[self.edge_buyers[edge]],
                value,
            )
        })
    }

    /// Sellers valued by the buyer at `buyer_idx` with valuation and current price, in
    /// insertion order of the edges.
    pub(crate) fn buyer_options(&self, buyer_idx: usize) -> impl Iterator<Item = (&K, V, V)> + '_ {
        self.buyer_edges[buyer_idx].iter().map(move |&edge| {
            let seller = self.edge_sellers[edge];
            (&self.sellers[seller], self.values[edge], self.prices[seller])
        })
    }
}

#[inline]
fn is_comparable<V: PartialOrd>(value: &V) -> bool {
    value.partial_cmp(value).is_some()
}

/// Builds a market graph from seller, buyer and edge declarations.
///
/// Fails without returning a partial graph if the edges do not form a bipartite graph
/// between sellers and buyers, or if a price or valuation is missing.
pub fn build_market<K, V, S, B, E>(
    sellers: S,
    buyers: B,
    edges: E,
) -> Result<MarketGraph<K, V>, anyhow::Error>
where
    K: NodeKey,
    V: Amount,
    S: IntoIterator<Item = Seller<K, V>>,
    B: IntoIterator<Item = K>,
    E: IntoIterator<Item = ValuationEdge<K, V>>,
{
    let mut market = MarketGraph::new();
    for seller in sellers {
        let price = seller
            .price
            .ok_or_else(|| MarketError::MissingPrice(format!("{:?}", seller.key)))?;
        market.add_seller(seller.key, price)?;
    }
    for buyer in buyers {
        market.add_buyer(buyer)?;
    }
    for edge in edges {
        let (seller, buyer) = market.resolve_edge(&edge.from, &edge.to)?;
        let valuation = edge.valuation.ok_or_else(|| MarketError::MissingValuation {
            seller: format!("{:?}", market.sellers[seller]),
            buyer: format!("{:?}", market.buyers[buyer]),
        })?;
        market.push_edge(seller, buyer, valuation)?;
    }
    trace!(
        "market built: {} sellers, {} buyers, {} edges",
        market.num_sellers(),
        market.num_buyers(),
        market.num_of_edges()
    );
    Ok(market)
}
