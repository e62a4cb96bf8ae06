//! Error Types

use thiserror::Error;

use crate::provider::ProviderKind;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, PulseError>;

/// Analysis error types
#[derive(Error, Debug)]
pub enum PulseError {
    /// No API key could be resolved for the provider
    #[error("Missing API key for {0}")]
    MissingCredential(ProviderKind),

    /// Network-level failure talking to an upstream API
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Upstream answered successfully but without any text
    #[error("Empty response from provider")]
    EmptyResponse,

    /// Text was returned but no usable report could be recovered from it
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Provider identifier not recognised
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PulseError {
    /// Whether the failure is worth another attempt against the same provider
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::UpstreamStatus { .. }
                | Self::EmptyResponse
                | Self::MalformedPayload(_)
                | Self::Io(_)
        )
    }

    /// Convert to a message suitable for the dashboard banner
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential(kind) => {
                format!("Configure the {} API key in settings first.", kind.label())
            }
            Self::UnknownProvider(name) => format!("Provider '{name}' is not supported."),
            _ => CONNECTION_INTERRUPTED.into(),
        }
    }
}

/// Banner text shown whenever an analysis cycle fails for a reason other
/// than missing configuration.
pub const CONNECTION_INTERRUPTED: &str =
    "Connection interrupted. Check the API key or network settings.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_not_retryable() {
        let err = PulseError::MissingCredential(ProviderKind::DeepSeek);
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("DEEPSEEK"));
    }

    #[test]
    fn transport_failures_share_the_static_banner() {
        let err = PulseError::UpstreamStatus {
            status: 503,
            body: "busy".into(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), CONNECTION_INTERRUPTED);
    }
}
