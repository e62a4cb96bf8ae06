//! Application State

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pulse_core::{MarketItem, ProviderKind, SettingsStore};
use pulse_market::CoinPrice;
use pulse_notify::Notifier;

use crate::orchestrator::{Orchestrator, PollerHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Fetch cycle and display state
    pub orchestrator: Arc<Orchestrator>,

    /// Trigger channel into the polling loop
    pub poller: PollerHandle,

    /// Persisted user settings
    pub settings: Arc<SettingsStore>,

    /// Messaging dispatcher, used directly for the connection test
    pub notifier: Arc<dyn Notifier>,
}

/// Dashboard phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Loading,
    Error,
}

/// Everything the dashboard renders
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    pub status: Status,
    /// Sentiment banner; carries progress and error text as well
    pub sentiment: String,
    pub items: Vec<MarketItem>,
    pub prices: Vec<CoinPrice>,
    pub last_updated: Option<DateTime<Utc>>,
    pub provider: ProviderKind,
}

impl DisplayState {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            status: Status::Idle,
            sentiment: "Initializing market connection...".into(),
            items: Vec::new(),
            prices: Vec::new(),
            last_updated: None,
            provider,
        }
    }
}
