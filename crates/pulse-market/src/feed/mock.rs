//! Mock Price Feed
//!
//! Static prices for offline runs and tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::PriceFeed;
use crate::model::CoinPrice;

/// (id, symbol, name, price, 24h change)
const TABLE: &[(&str, &str, &str, Decimal, Decimal)] = &[
    ("bitcoin", "BTC", "Bitcoin", dec!(97500), dec!(2.5)),
    ("ethereum", "ETH", "Ethereum", dec!(3450), dec!(1.8)),
    ("solana", "SOL", "Solana", dec!(195), dec!(4.2)),
    ("ripple", "XRP", "XRP", dec!(2.35), dec!(0.9)),
    ("cardano", "ADA", "Cardano", dec!(0.95), dec!(-1.2)),
    ("avalanche-2", "AVAX", "Avalanche", dec!(42.00), dec!(5.5)),
    ("dogecoin", "DOGE", "Dogecoin", dec!(0.38), dec!(12.0)),
    ("chainlink", "LINK", "Chainlink", dec!(24.50), dec!(3.1)),
    ("polkadot", "DOT", "Polkadot", dec!(7.20), dec!(0.8)),
    ("litecoin", "LTC", "Litecoin", dec!(105), dec!(1.5)),
];

/// Feed with a fixed price table
#[derive(Default)]
pub struct MockPriceFeed;

impl MockPriceFeed {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn top_coins(&self) -> Vec<CoinPrice> {
        TABLE
            .iter()
            .map(|&(id, symbol, name, price, change)| {
                CoinPrice::new(id, symbol, name, price).with_change(change)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "MockFeed"
    }
}
