//! Chat-Completion Provider
//!
//! One adapter for every backend that speaks the `/chat/completions`
//! dialect. DeepSeek, Grok, Qwen and ChatGPT differ only in base URL and
//! model name. Single attempt, no retry.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use pulse_core::{
    AnalysisProvider, MarketReport, Message, ProviderKind, PulseError, Result,
    prompt::USER_REQUEST, provider::GenerationOptions, report::RawReport,
};

use crate::http;

const TEMPERATURE: f32 = 0.5;

/// Generic chat-completion adapter
pub struct ChatCompletionProvider {
    kind: ProviderKind,
    http: Client,
    base_url: String,
    options: GenerationOptions,
}

impl ChatCompletionProvider {
    /// Adapter preconfigured for `kind`; `None` for providers that do not
    /// use the chat-completion dialect.
    pub fn for_kind(kind: ProviderKind) -> Option<Self> {
        let (base_url, model) = match kind {
            ProviderKind::DeepSeek => ("https://api.deepseek.com", "deepseek-chat"),
            ProviderKind::Grok => ("https://api.x.ai/v1", "grok-beta"),
            ProviderKind::Qwen => (
                "https://dashscope.aliyuncs.com/compatible-mode/v1",
                "qwen-turbo",
            ),
            ProviderKind::ChatGpt => ("https://api.openai.com/v1", "gpt-4o"),
            ProviderKind::Gemini => return None,
        };
        Some(Self::new(kind, base_url, model))
    }

    pub fn new(kind: ProviderKind, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            http: http::client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options: GenerationOptions::new(model, TEMPERATURE),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }
}

#[async_trait]
impl AnalysisProvider for ChatCompletionProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn produce_report(&self, prompt: &str, credential: &str) -> Result<MarketReport> {
        let body = ChatRequest {
            model: &self.options.model,
            messages: vec![Message::system(prompt), Message::user(USER_REQUEST)],
            temperature: self.options.temperature,
            stream: false,
        };

        let response: ChatResponse = http::send_json(
            self.http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(credential)
                .json(&body),
        )
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(PulseError::EmptyResponse)?;

        let report = RawReport::from_text(&content)?.into_report(self.kind, &[], Utc::now());
        info!(
            provider = %self.kind,
            model = %self.options.model,
            items = report.items.len(),
            "report received"
        );
        Ok(report)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
