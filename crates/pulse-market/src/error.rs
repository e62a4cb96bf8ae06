//! Error Types for price feeds

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Price API returned {0}")]
    Status(u16),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
