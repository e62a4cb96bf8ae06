//! # pulse-market
//!
//! Spot prices shown next to the analysis report.
//!
//! A price feed never fails from the caller's point of view: any upstream
//! trouble degrades to an empty list, which the dashboard renders as an
//! absent ticker.
//!
//! ```text
//! ┌──────────────┐   GET /coins/markets   ┌───────────────┐
//! │ CoinGeckoFeed│ ─────────────────────▶ │  CoinGecko    │
//! └──────────────┘                        └───────────────┘
//!        │ Vec<CoinPrice> (top 20 by market cap, or empty)
//!        ▼
//!   orchestrator
//! ```

pub mod error;
pub mod feed;
pub mod model;

pub use error::{MarketDataError, Result};
pub use feed::{CoinGeckoFeed, MockPriceFeed, PriceFeed};
pub use model::CoinPrice;
