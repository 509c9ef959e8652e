//! API error types and responses.
//!
//! Expected denials are not errors inside the core — the gate returns a
//! typed `Decision`. This module is where the enforce-style endpoints turn
//! a denial into a status code: `RateLimited` becomes 429 with a
//! `Retry-After` header, `QuotaExceeded` and `FeatureNotAvailable` become
//! 403 with stable machine-readable codes. A denial is never a bare 500.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use metergate_core::{Decision, DenyReason};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The plan does not include the requested feature.
    #[error("feature not available on this plan")]
    FeatureNotAvailable,

    /// A rate-limit window is full.
    #[error("rate limited until {reset_at}")]
    RateLimited {
        /// When the violated window resets.
        reset_at: DateTime<Utc>,
    },

    /// The monthly quota is exhausted.
    #[error("monthly quota exceeded: used={used}, limit={limit}")]
    QuotaExceeded {
        /// Usage so far this month.
        used: u64,
        /// The plan's monthly limit.
        limit: i64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// The backing store is unreachable.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ApiError {
    /// The enforce-style mapping of a denial into an error, `None` when the
    /// decision allows the operation.
    #[must_use]
    pub fn from_decision(decision: &Decision) -> Option<Self> {
        match decision.reason? {
            DenyReason::FeatureNotAvailable => Some(Self::FeatureNotAvailable),
            DenyReason::RateLimited => Some(Self::RateLimited {
                reset_at: decision.retry_at().unwrap_or_else(Utc::now),
            }),
            DenyReason::QuotaExceeded => {
                let quota = decision.quota.unwrap_or(metergate_core::QuotaStatus {
                    allowed: false,
                    used: 0,
                    limit: 0,
                });
                Some(Self::QuotaExceeded {
                    used: quota.used,
                    limit: quota.limit,
                })
            }
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::FeatureNotAvailable => (
                StatusCode::FORBIDDEN,
                DenyReason::FeatureNotAvailable.as_str(),
                "This feature is not included in the current plan".to_string(),
                None,
            ),
            Self::RateLimited { reset_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                DenyReason::RateLimited.as_str(),
                "Rate limit exceeded".to_string(),
                Some(serde_json::json!({ "reset_at": reset_at })),
            ),
            Self::QuotaExceeded { used, limit } => (
                StatusCode::FORBIDDEN,
                DenyReason::QuotaExceeded.as_str(),
                "Monthly quota exceeded".to_string(),
                Some(serde_json::json!({
                    "used": used,
                    "limit": limit
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::StoreUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                msg.clone(),
                None,
            ),
        };

        let retry_after = match &self {
            Self::RateLimited { reset_at } => Some((*reset_at - Utc::now()).num_seconds().max(0)),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<metergate_store::StoreError> for ApiError {
    fn from(err: metergate_store::StoreError) -> Self {
        match err {
            metergate_store::StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            metergate_store::StoreError::Database(msg)
            | metergate_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
