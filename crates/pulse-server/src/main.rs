//! crypto-pulse server
//!
//! Polls the selected AI provider for a market report on a fixed period,
//! keeps the latest report and spot prices for the dashboard API, and
//! forwards new items to Telegram.

mod config;
mod handlers;
mod orchestrator;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulse_core::{PromptBuilder, ProviderKind, SettingsStore};
use pulse_market::{CoinGeckoFeed, MockPriceFeed, PriceFeed};
use pulse_notify::{Notifier, TelegramNotifier};
use pulse_runtime::AnalysisService;

use crate::config::{PriceSource, PulseConfig};
use crate::orchestrator::{Orchestrator, Poller};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PulseConfig::from_env()?;

    let settings = Arc::new(SettingsStore::open(config.settings_dir.clone()));

    let analysis = AnalysisService::with_default_providers(
        PromptBuilder::new(config.output_language.clone()),
        config.default_provider,
    )
    .with_env_keys(config.env_keys.clone());
    for kind in ProviderKind::ALL {
        if config.env_keys.get(kind).is_some() {
            tracing::info!(provider = %kind, "✓ Environment API key configured");
        }
    }

    let prices: Arc<dyn PriceFeed> = match config.price_source {
        PriceSource::CoinGecko => Arc::new(CoinGeckoFeed::new()),
        PriceSource::Mock => Arc::new(MockPriceFeed::new()),
    };
    tracing::info!(feed = prices.name(), "price feed selected");

    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new());

    let orchestrator = Arc::new(Orchestrator::new(
        analysis,
        prices,
        notifier.clone(),
        settings.clone(),
        config.notify_pause,
    ));
    let (poller, poller_handle) = Poller::spawn(
        orchestrator.clone(),
        config.settle_delay,
        config.refresh_interval,
    );

    let state = AppState {
        orchestrator,
        poller: poller_handle,
        settings,
        notifier,
    };
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 crypto-pulse running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  GET  /api/providers      - Available AI providers");
    tracing::info!("  GET  /api/dashboard      - Report, prices and status");
    tracing::info!("  POST /api/refresh        - Refresh now");
    tracing::info!("  PUT  /api/provider       - Switch provider");
    tracing::info!("  GET  /api/settings       - Settings (keys masked)");
    tracing::info!("  PUT  /api/settings       - Save settings");
    tracing::info!("  POST /api/telegram/test  - Test Telegram delivery");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
