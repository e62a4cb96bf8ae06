//! # pulse-notify
//!
//! Per-item alerts for new market findings.
//!
//! The `Notifier` trait is fire-and-forget from the caller's side: delivery
//! failures are logged here and never propagated. Deciding *which* items to
//! send is the watermark's job in `pulse-core`.

pub mod error;
pub mod format;
pub mod telegram;

pub use error::{NotifyError, Result};
pub use format::{render_message, truncate_summary};
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use pulse_core::{MarketItem, TelegramTarget};

/// Message sent by the connection test
pub const TEST_MESSAGE: &str =
    "🎉 CryptoPulse connected! New market alerts will be delivered to this chat.";

/// Notification dispatcher (Strategy pattern)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send the connection-test message; `true` when the channel accepted it
    async fn send_test(&self, target: &TelegramTarget) -> bool;

    /// Send one item alert. Failures are logged, never returned.
    async fn notify(&self, target: &TelegramTarget, item: &MarketItem);
}
