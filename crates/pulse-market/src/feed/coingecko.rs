//! CoinGecko `/coins/markets` feed

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::PriceFeed;
use crate::error::{MarketDataError, Result};
use crate::model::CoinPrice;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const TOP_N: u32 = 20;

/// Public CoinGecko API, no key required
pub struct CoinGeckoFeed {
    http: Client,
    base_url: String,
}

impl Default for CoinGeckoFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl CoinGeckoFeed {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self) -> Result<Vec<CoinPrice>> {
        let per_page = TOP_N.to_string();
        let response = self
            .http
            .get(format!("{}/coins/markets", self.base_url))
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("sparkline", "false"),
                ("price_change_percentage", "24h"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let markets: Vec<MarketEntry> = serde_json::from_slice(&bytes)?;
        Ok(markets.into_iter().filter_map(MarketEntry::into_price).collect())
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn top_coins(&self) -> Vec<CoinPrice> {
        match self.fetch().await {
            Ok(coins) => {
                debug!(coins = coins.len(), "prices fetched");
                coins
            }
            Err(e) => {
                warn!(feed = self.name(), error = %e, "price fetch failed");
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

#[derive(Deserialize)]
struct MarketEntry {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    current_price: Option<Decimal>,
    #[serde(default)]
    price_change_percentage_24h: Option<Decimal>,
    #[serde(default)]
    image: Option<String>,
}

impl MarketEntry {
    /// Coins without a current price are dropped
    fn into_price(self) -> Option<CoinPrice> {
        let current_price = self.current_price?;
        Some(CoinPrice {
            id: self.id,
            symbol: self.symbol.to_uppercase(),
            name: self.name,
            current_price,
            price_change_percentage_24h: self.price_change_percentage_24h,
            image: self.image,
        })
    }
}
