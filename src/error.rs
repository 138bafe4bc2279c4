//! Error types for the tutor gateway

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for tutor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the tutor gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Third-party API failure (network, auth, quota, server error)
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Third-party API throttled the request
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Third-party API rejected the request as malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client resubmitted the message it just sent
    #[error("duplicate user turn")]
    DuplicateTurn,

    /// Missing or invalid field in a client request
    #[error("validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Classify a non-success response from a third-party API
    #[must_use]
    pub fn from_status(service: &str, status: StatusCode, body: &str) -> Self {
        let detail = format!("{service} error {status}: {body}");
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(detail),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::InvalidRequest(detail)
            }
            _ => Self::Upstream(detail),
        }
    }

    /// Whether the failure came from a third-party call
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Upstream(_)
                | Self::RateLimited(_)
                | Self::InvalidRequest(_)
                | Self::Http(_)
                | Self::Serialization(_)
        )
    }

    /// Collapse any third-party failure into `Upstream`, tagged with the stage
    #[must_use]
    pub fn into_upstream(self, stage: &str) -> Self {
        match self {
            Self::Upstream(msg) => Self::Upstream(format!("{stage}: {msg}")),
            e if e.is_upstream() => Self::Upstream(format!("{stage}: {e}")),
            e => e,
        }
    }
}
