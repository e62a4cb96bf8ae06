//! # pulse-runtime
//!
//! Concrete analysis providers for crypto-pulse.
//!
//! ## Providers
//!
//! - **Gemini** (default): search-grounded `generateContent` call with retry
//! - **DeepSeek / Grok / Qwen / ChatGPT**: one generic chat-completion
//!   adapter parameterized by base URL and model name
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pulse_runtime::AnalysisService;
//!
//! let service = AnalysisService::with_default_providers(PromptBuilder::default(), ProviderKind::Gemini)
//!     .with_env_keys(env_keys);
//! let report = service.analyze(ProviderKind::Gemini, &settings.api_keys).await?;
//! ```

pub mod chat_completion;
pub mod facade;
pub mod gemini;
mod http;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use chat_completion::ChatCompletionProvider;
pub use facade::AnalysisService;
pub use gemini::GeminiProvider;
pub use retry::RetryPolicy;

// Re-export core types for convenience
pub use pulse_core::{AnalysisProvider, MarketReport, ProviderKind, PulseError, Result};
