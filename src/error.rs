use thiserror::Error;

/// Failures reported by market construction and by the auction loop.
///
/// Node keys are rendered with their `Debug` representation so the error type stays
/// independent of the key and amount types of the market.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error("edge {left} -- {right} connects two {side}, market graph must be bipartite")]
    NotBipartite {
        left: String,
        right: String,
        side: &'static str,
    },
    #[error("node {0} is declared more than once")]
    DuplicateNode(String),
    #[error("edge references unknown node {0}")]
    UnknownNode(String),
    #[error("seller {0} has no price")]
    MissingPrice(String),
    #[error("edge {seller} -- {buyer} has no valuation")]
    MissingValuation { seller: String, buyer: String },
    #[error("edge {seller} -- {buyer} is declared more than once")]
    DuplicateEdge { seller: String, buyer: String },
    #[error("amount {0} is not comparable")]
    InvalidAmount(String),
    #[error("{0} is not a seller")]
    UnknownSeller(String),
    #[error("price increment must be positive, got {0}")]
    NonPositiveIncrement(String),
    #[error("market is still over-demanded after {rounds} rounds")]
    NotConverged { rounds: u32 },
}
