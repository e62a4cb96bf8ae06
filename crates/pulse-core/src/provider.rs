//! Analysis Provider Strategy Pattern
//!
//! Defines a common interface for every AI backend (Gemini, DeepSeek, Grok,
//! Qwen, ChatGPT) so the facade can dispatch by identifier without knowing
//! whether the backend speaks a native API or a chat-completion dialect.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_core::provider::{AnalysisProvider, ProviderKind};
//!
//! let provider = ChatCompletionProvider::for_kind(ProviderKind::DeepSeek)?;
//! let report = provider.produce_report(&prompt, &api_key).await?;
//! ```

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};
use crate::market::MarketReport;

/// Identifier of an upstream AI service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    DeepSeek,
    Grok,
    Qwen,
    #[serde(rename = "chatgpt")]
    ChatGpt,
}

impl ProviderKind {
    /// Every supported provider, in menu order
    pub const ALL: [Self; 5] = [
        Self::Gemini,
        Self::DeepSeek,
        Self::Grok,
        Self::Qwen,
        Self::ChatGpt,
    ];

    /// Stable identifier used in settings files and the HTTP API
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
            Self::Grok => "grok",
            Self::Qwen => "qwen",
            Self::ChatGpt => "chatgpt",
        }
    }

    /// Upper-case tag used in banner messages
    pub fn label(self) -> String {
        self.as_str().to_uppercase()
    }

    /// Human-facing product name
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini Flash",
            Self::DeepSeek => "DeepSeek R1",
            Self::Grok => "Grok AI",
            Self::Qwen => "Qwen",
            Self::ChatGpt => "ChatGPT-4o",
        }
    }

    /// Whether the provider grounds its answer with a live web search
    pub const fn is_search_grounded(self) -> bool {
        matches!(self, Self::Gemini)
    }

    /// Where the provider's information comes from
    pub const fn data_source(self) -> &'static str {
        if self.is_search_grounded() {
            "Google Search"
        } else {
            "model knowledge base"
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            "grok" => Ok(Self::Grok),
            "qwen" => Ok(Self::Qwen),
            "chatgpt" | "openai" => Ok(Self::ChatGpt),
            other => Err(PulseError::UnknownProvider(other.to_string())),
        }
    }
}

/// Sampling configuration handed to a backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gemini-2.5-flash", "deepseek-chat")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,
}

impl GenerationOptions {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }
}

/// Strategy trait for analysis backends
///
/// Implementations never panic on upstream trouble: every failure is
/// returned as an `Err` so the facade always sees either a complete report
/// or an explicit absence.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Which provider this implementation serves
    fn kind(&self) -> ProviderKind;

    /// Produce a market report from a fully built system prompt
    async fn produce_report(&self, prompt: &str, credential: &str) -> Result<MarketReport>;
}
