//! Domain Models
//!
//! Prices are relayed verbatim from the aggregator. `rust_decimal` keeps
//! them exact; they are serialized as JSON numbers for the dashboard.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spot price of one coin
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPrice {
    /// Aggregator id (e.g., "bitcoin")
    pub id: String,

    /// Upper-case ticker (e.g., "BTC")
    pub symbol: String,

    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Current price in USD
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,

    /// 24-hour change in percent, when the aggregator reports one
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub price_change_percentage_24h: Option<Decimal>,

    /// Logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CoinPrice {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            current_price,
            price_change_percentage_24h: None,
            image: None,
        }
    }

    #[must_use]
    pub fn with_change(mut self, change: Decimal) -> Self {
        self.price_change_percentage_24h = Some(change);
        self
    }
}
