//! # pulse-core
//!
//! Provider-agnostic building blocks for the crypto-pulse market monitor.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Analysis cycle                          │
//! │  ┌──────────────┐  ┌────────────────┐  ┌──────────────────┐  │
//! │  │   Prompt     │  │ AnalysisProvider│  │  JSON extractor  │  │
//! │  │   Builder    │──│   (Strategy)    │──│  + normalization │  │
//! │  └──────────────┘  └────────────────┘  └──────────────────┘  │
//! │                            │                                 │
//! │                   ┌────────▼─────────┐                       │
//! │                   │  MarketReport    │──▶ Watermark diff     │
//! │                   └──────────────────┘                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `AnalysisProvider` trait lets the runtime swap Gemini, DeepSeek,
//! Grok, Qwen or ChatGPT without the caller knowing transport details.

pub mod error;
pub mod extract;
pub mod market;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod report;
pub mod settings;
pub mod watermark;

pub use error::{PulseError, Result};
pub use market::{MarketItem, MarketReport, Signal};
pub use message::{Message, Role};
pub use prompt::PromptBuilder;
pub use provider::{AnalysisProvider, ProviderKind};
pub use settings::{ApiKeys, Settings, SettingsStore, TelegramConfig, TelegramTarget};
pub use watermark::{NotificationWatermark, NotifyPlan};
