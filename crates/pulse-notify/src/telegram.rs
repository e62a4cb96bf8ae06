//! Telegram Bot API dispatcher

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pulse_core::{MarketItem, TelegramTarget};

use crate::error::{NotifyError, Result};
use crate::format::render_local;
use crate::{Notifier, TEST_MESSAGE};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Sends `sendMessage` calls for a bot token supplied per call
pub struct TelegramNotifier {
    http: Client,
    api_base: String,
}

impl Default for TelegramNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramNotifier {
    pub fn new() -> Self {
        Self::with_api_base(DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// POST one Markdown message to the target chat
    pub async fn send_message(
        &self,
        target: &TelegramTarget,
        text: &str,
        disable_preview: bool,
    ) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, target.bot_token);
        let body = SendMessage {
            chat_id: &target.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: disable_preview.then_some(true),
        };

        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let description = response
            .json::<ApiError>()
            .await
            .ok()
            .and_then(|e| e.description)
            .unwrap_or_else(|| status.to_string());
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            description,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_test(&self, target: &TelegramTarget) -> bool {
        match self.send_message(target, TEST_MESSAGE, false).await {
            Ok(()) => {
                info!(chat_id = %target.chat_id, "telegram connection test passed");
                true
            }
            Err(e) => {
                warn!(chat_id = %target.chat_id, error = %e, "telegram connection test failed");
                false
            }
        }
    }

    async fn notify(&self, target: &TelegramTarget, item: &MarketItem) {
        let text = render_local(item);
        match self.send_message(target, &text, true).await {
            Ok(()) => debug!(item = %item.id, "notification sent"),
            Err(e) => warn!(
                item = %item.id,
                retryable = e.is_retryable(),
                error = %e,
                "notification failed"
            ),
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    disable_web_page_preview: Option<bool>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    description: Option<String>,
}
