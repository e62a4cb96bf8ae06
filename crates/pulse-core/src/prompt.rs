//! System prompt construction.
//!
//! Pure string building: the output depends only on the provider, the
//! output language and the instant passed in.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::provider::ProviderKind;

/// Fixed user turn sent alongside the system prompt
pub const USER_REQUEST: &str =
    "Analyze the current crypto market and produce the report as JSON.";

const DEFAULT_LANGUAGE: &str = "Simplified Chinese";

/// Exact schema every provider must answer with
const REPORT_SCHEMA: &str = r#"JSON structure (follow it exactly):
{
  "overallSentiment": "one-paragraph market mood summary",
  "items": [
    {
      "id": "unique_id",
      "timestamp": "ISO8601_time",
      "title": "headline",
      "summary": "summary",
      "source": "source name",
      "relatedCoins": ["BTC"],
      "onChainInsight": "on-chain observation or null",
      "signal": "BUY/SELL/NEUTRAL/HOLD",
      "confidence": 90,
      "sourceCredibility": 8
    }
  ]
}"#;

/// Builds provider-specific system prompts
#[derive(Clone, Debug)]
pub struct PromptBuilder {
    language: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl PromptBuilder {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Build the complete system prompt for `kind` as of `now`.
    pub fn build(&self, kind: ProviderKind, now: DateTime<Utc>) -> String {
        let common = format!(
            "Current standard time (UTC): {now}\n\
             Your task is to analyze the cryptocurrency market.\n\
             Write every human-readable field in {language} and answer with JSON only.\n\
             {REPORT_SCHEMA}",
            now = now.to_rfc3339_opts(SecondsFormat::Millis, true),
            language = self.language,
        );

        format!("{}\n{}", persona(kind), common)
    }
}

fn persona(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => {
            "You are a top-tier crypto market intelligence analyst with a view across the whole web.\n\
             Style: fast, accurate, broad coverage.\n\
             **You must use the Google Search tool to gather the latest real-time news.**"
        }
        ProviderKind::DeepSeek => {
            "You are now **DeepSeek**.\n\
             Style: strictly rational, cold and rigorous. Focus on on-chain data logic and probability.\n\
             Note: as an API model you may not have live internet access; reason from the most recent knowledge you hold."
        }
        ProviderKind::Grok => {
            "You are now **Grok**.\n\
             Style: witty, sharp and contrarian. Watch community sentiment and meme trends.\n\
             Note: you may lack real-time grounding; rely on your internal knowledge."
        }
        ProviderKind::Qwen => {
            "You are now **Qwen**.\n\
             Style: macro perspective, focused on Asian markets and policy interpretation.\n\
             Note: you may lack real-time grounding; rely on your internal knowledge."
        }
        ProviderKind::ChatGpt => {
            "You are now **ChatGPT** (OpenAI).\n\
             Style: professional, objective, Wall Street institutional tone.\n\
             Note: you may lack real-time grounding; rely on your internal knowledge."
        }
    }
}
