//! Client error types.

use chrono::{DateTime, Utc};

/// Errors that can occur when using the metergate client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The enforce endpoint denied the operation: rate limited.
    #[error("rate limited, retry after {reset_at:?}")]
    RateLimited {
        /// When the violated window resets, if the server said.
        reset_at: Option<DateTime<Utc>>,
    },

    /// The enforce endpoint denied the operation: quota exhausted.
    #[error("monthly quota exceeded: used={used}, limit={limit}")]
    QuotaExceeded {
        /// Usage so far this month.
        used: u64,
        /// The plan's monthly limit.
        limit: i64,
    },

    /// The enforce endpoint denied the operation: feature not in plan.
    #[error("feature not available on this plan")]
    FeatureNotAvailable,

    /// Server returned some other error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether this error is an enforcement denial (as opposed to a
    /// transport or server fault).
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::QuotaExceeded { .. } | Self::FeatureNotAvailable
        )
    }
}
