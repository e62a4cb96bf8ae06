//! Notification Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    /// Request never got an answer; the URL embeds the bot token and is
    /// stripped before wrapping
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// The Bot API answered with an error
    #[error("Telegram rejected message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.without_url())
    }
}

impl NotifyError {
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }
}
