//! Gemini Provider
//!
//! Search-grounded adapter: one `generateContent` call with the Google
//! Search tool enabled, retried with exponential backoff. Citation URLs from
//! the grounding metadata are attached to items by position.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pulse_core::{
    AnalysisProvider, MarketReport, ProviderKind, PulseError, Result,
    provider::GenerationOptions, report::RawReport,
};

use crate::http;
use crate::retry::{RetryPolicy, with_backoff};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini `generateContent` adapter
pub struct GeminiProvider {
    http: Client,
    base_url: String,
    options: GenerationOptions,
    retry: RetryPolicy,
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiProvider {
    pub fn new() -> Self {
        Self {
            http: http::client(),
            base_url: DEFAULT_BASE_URL.into(),
            options: GenerationOptions::new(DEFAULT_MODEL, 0.3),
            retry: RetryPolicy::default(),
        }
    }

    /// Point the adapter at another endpoint (proxies, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.options.model)
    }

    /// One request/parse attempt
    async fn attempt(&self, prompt: &str, credential: &str) -> Result<MarketReport> {
        let body = GenerateRequest {
            contents: vec![Content::user(prompt)],
            tools: vec![Tool {
                google_search: EmptyObject {},
            }],
            generation_config: GenerationConfig {
                temperature: self.options.temperature,
            },
        };

        let response: GenerateResponse = http::send_json(
            self.http
                .post(self.endpoint())
                .header("x-goog-api-key", credential)
                .json(&body),
        )
        .await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or(PulseError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(PulseError::EmptyResponse);
        }

        let citations: Vec<Option<String>> = candidate
            .grounding_metadata
            .map(|meta| {
                meta.grounding_chunks
                    .into_iter()
                    .map(|chunk| chunk.web.and_then(|w| w.uri))
                    .collect()
            })
            .unwrap_or_default();
        debug!(citations = citations.len(), "grounding metadata received");

        let mut report = RawReport::from_text(&text)?.into_report(
            ProviderKind::Gemini,
            &citations,
            Utc::now(),
        );
        report.items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(report)
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn produce_report(&self, prompt: &str, credential: &str) -> Result<MarketReport> {
        let report = with_backoff(&self.retry, "gemini.generate_content", move || {
            self.attempt(prompt, credential)
        })
        .await?;

        info!(
            provider = %ProviderKind::Gemini,
            items = report.items.len(),
            "report received"
        );
        Ok(report)
    }
}

// Wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user(text: &'a str) -> Self {
        Self {
            role: "user",
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
}
