//! Enforcement decisions.
//!
//! The enforcement facade never throws for expected denials — it returns a
//! typed [`Decision`] that HTTP-adjacent callers translate into status codes
//! (`RateLimited` → 429 with a retry time, `QuotaExceeded` and
//! `FeatureNotAvailable` → 403).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::limits::LimitClass;

/// Why a metered operation was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The plan lacks the capability. Permanent until a plan change.
    FeatureNotAvailable,

    /// A fixed-window limit was hit. Transient; retryable after `reset_at`.
    RateLimited,

    /// The monthly quota is exhausted. Retryable after the next billing
    /// month or a plan upgrade.
    QuotaExceeded,
}

impl DenyReason {
    /// Stable machine-readable code for this reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FeatureNotAvailable => "feature_not_available",
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
        }
    }

    /// Whether waiting (without a plan change) can clear the denial.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::QuotaExceeded)
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a fixed-window rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    /// Whether the request fits the window.
    pub allowed: bool,

    /// The limit class the decision belongs to.
    pub class: LimitClass,

    /// The configured window maximum.
    pub limit: u64,

    /// Requests left in the window after this decision.
    pub remaining: u64,

    /// When the window rolls over and the counter resets.
    pub reset_at: DateTime<Utc>,
}

/// The outcome of a monthly-quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Whether another use fits the quota.
    pub allowed: bool,

    /// Usage so far this month.
    pub used: u64,

    /// The plan's monthly limit (`-1` = unlimited).
    pub limit: i64,
}

/// The structured answer to "may subject S perform operation O right now?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the operation may proceed.
    pub allowed: bool,

    /// Why it may not, when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,

    /// The binding rate-limit window (tightest on allow, violated on deny).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitDecision>,

    /// The quota state, when the check got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaStatus>,
}

impl Decision {
    /// An allow decision carrying whatever state the checks produced.
    #[must_use]
    pub const fn allow(rate_limit: Option<RateLimitDecision>, quota: Option<QuotaStatus>) -> Self {
        Self {
            allowed: true,
            reason: None,
            rate_limit,
            quota,
        }
    }

    /// Denied: the plan does not include the feature.
    #[must_use]
    pub const fn feature_not_available() -> Self {
        Self {
            allowed: false,
            reason: Some(DenyReason::FeatureNotAvailable),
            rate_limit: None,
            quota: None,
        }
    }

    /// Denied: a rate-limit window is full.
    #[must_use]
    pub const fn rate_limited(window: RateLimitDecision) -> Self {
        Self {
            allowed: false,
            reason: Some(DenyReason::RateLimited),
            rate_limit: Some(window),
            quota: None,
        }
    }

    /// Denied: the monthly quota is exhausted.
    #[must_use]
    pub const fn quota_exceeded(quota: QuotaStatus) -> Self {
        Self {
            allowed: false,
            reason: Some(DenyReason::QuotaExceeded),
            rate_limit: None,
            quota: Some(quota),
        }
    }

    /// When the client should retry, for rate-limited denials.
    #[must_use]
    pub fn retry_at(&self) -> Option<DateTime<Utc>> {
        match self.reason {
            Some(DenyReason::RateLimited) => self.rate_limit.map(|rl| rl.reset_at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deny_reason_codes_are_stable() {
        assert_eq!(DenyReason::FeatureNotAvailable.as_str(), "feature_not_available");
        assert_eq!(DenyReason::RateLimited.as_str(), "rate_limited");
        assert_eq!(DenyReason::QuotaExceeded.as_str(), "quota_exceeded");
    }

    #[test]
    fn retryability() {
        assert!(!DenyReason::FeatureNotAvailable.is_retryable());
        assert!(DenyReason::RateLimited.is_retryable());
        assert!(DenyReason::QuotaExceeded.is_retryable());
    }

    #[test]
    fn rate_limited_decision_carries_reset() {
        let reset_at = Utc.with_ymd_and_hms(2026, 8, 7, 12, 1, 0).unwrap();
        let decision = Decision::rate_limited(RateLimitDecision {
            allowed: false,
            class: LimitClass::Minute,
            limit: 100,
            remaining: 0,
            reset_at,
        });
        assert!(!decision.allowed);
        assert_eq!(decision.retry_at(), Some(reset_at));
    }

    #[test]
    fn quota_denial_has_no_retry_time() {
        let decision = Decision::quota_exceeded(QuotaStatus {
            allowed: false,
            used: 5,
            limit: 5,
        });
        assert_eq!(decision.retry_at(), None);
    }

    #[test]
    fn decision_serde_omits_empty_fields() {
        let decision = Decision::feature_not_available();
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["reason"], "feature_not_available");
        assert!(json.get("rate_limit").is_none());
        assert!(json.get("quota").is_none());
    }
}
