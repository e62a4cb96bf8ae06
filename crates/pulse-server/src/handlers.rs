//! HTTP Handlers

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use pulse_core::{ProviderKind, PulseError, Settings, TelegramConfig};

use crate::orchestrator::Trigger;
use crate::state::{AppState, DisplayState};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: ProviderKind,
    pub telegram_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: ProviderKind,
    pub display_name: &'static str,
    pub search_grounded: bool,
    pub data_source: &'static str,
    pub configured: bool,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct SwitchProviderRequest {
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct SwitchProviderResponse {
    pub provider: ProviderKind,
    pub changed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramTestRequest {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Serialize)]
pub struct TelegramTestResponse {
    pub success: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/providers", get(list_providers))
        .route("/api/dashboard", get(dashboard))
        .route("/api/refresh", post(refresh))
        .route("/api/provider", put(switch_provider))
        .route("/api/settings", get(get_settings).put(save_settings))
        .route("/api/telegram/test", post(test_telegram))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.orchestrator.selected_provider().await,
        telegram_enabled: state.settings.telegram().target().is_some(),
    })
}

pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    let selected = state.orchestrator.selected_provider().await;
    let providers = ProviderKind::ALL
        .into_iter()
        .map(|kind| ProviderInfo {
            id: kind,
            display_name: kind.display_name(),
            search_grounded: kind.is_search_grounded(),
            data_source: kind.data_source(),
            configured: state.orchestrator.has_credential(kind),
            selected: kind == selected,
        })
        .collect();
    Json(providers)
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DisplayState> {
    Json(state.orchestrator.snapshot().await)
}

/// Manual refresh; the fetch runs in the background
pub async fn refresh(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AcceptedResponse>), ApiError> {
    if state.poller.trigger(Trigger::Manual) {
        Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })))
    } else {
        Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "POLLER_UNAVAILABLE",
            "Refresh could not be scheduled.",
        ))
    }
}

/// Select a provider and fetch with it right away
pub async fn switch_provider(
    State(state): State<AppState>,
    Json(payload): Json<SwitchProviderRequest>,
) -> Result<(StatusCode, Json<SwitchProviderResponse>), ApiError> {
    let kind: ProviderKind = payload.provider.parse().map_err(|e: PulseError| {
        api_error(StatusCode::BAD_REQUEST, "UNKNOWN_PROVIDER", e.user_message())
    })?;

    let changed = state.orchestrator.select_provider(kind).await;
    if changed {
        state.poller.trigger(Trigger::ProviderSwitch);
    }

    let status = if changed { StatusCode::ACCEPTED } else { StatusCode::OK };
    Ok((status, Json(SwitchProviderResponse { provider: kind, changed })))
}

/// Stored settings with API keys masked
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let mut settings = state.settings.current();
    settings.api_keys = settings.api_keys.masked();
    Json(settings)
}

/// Replace and persist settings.
///
/// Keys echoed back in masked form keep their stored value, so a client
/// can round-trip `GET /api/settings` without knowing the secrets.
pub async fn save_settings(
    State(state): State<AppState>,
    Json(mut incoming): Json<Settings>,
) -> Result<Json<Settings>, ApiError> {
    let stored = state.settings.api_keys();
    for kind in ProviderKind::ALL {
        let echoed_mask = incoming
            .api_keys
            .get(kind)
            .is_some_and(|key| key.starts_with("****"));
        if echoed_mask {
            match stored.get(kind) {
                Some(key) => incoming.api_keys.set(kind, key),
                None => incoming.api_keys.set(kind, ""),
            }
        }
    }

    state.settings.save(incoming).map_err(|e| {
        tracing::error!(error = %e, "failed to persist settings");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SETTINGS_WRITE_FAILED",
            "Settings could not be saved.",
        )
    })?;

    tracing::info!("settings updated");
    Ok(get_settings(State(state)).await)
}

/// Send the connection-test message to the supplied target
pub async fn test_telegram(
    State(state): State<AppState>,
    Json(payload): Json<TelegramTestRequest>,
) -> Json<TelegramTestResponse> {
    let config = TelegramConfig {
        enabled: true,
        bot_token: payload.bot_token,
        chat_id: payload.chat_id,
    };
    let success = match config.target() {
        Some(target) => state.notifier.send_test(&target).await,
        None => false,
    };
    Json(TelegramTestResponse { success })
}
