//! Price Feeds
//!
//! Abstractions and implementations for spot-price sources.

mod coingecko;
mod mock;

pub use coingecko::CoinGeckoFeed;
pub use mock::MockPriceFeed;

use async_trait::async_trait;

use crate::model::CoinPrice;

/// Price feed trait (Strategy pattern)
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Top coins by market capitalization. Empty when the source is
    /// unavailable; this never fails.
    async fn top_coins(&self) -> Vec<CoinPrice>;

    /// Feed name
    fn name(&self) -> &str;
}
