//! The enforcement facade.
//!
//! The single entry point a request handler calls: "may subject S perform
//! metered operation O under plan P right now?". Checks run cheapest first
//! and short-circuit on the first failure:
//!
//! 1. Is the feature enabled for the plan at all?
//! 2. Rate limit (minute window, then hour window).
//! 3. Monthly quota.
//!
//! The gate is a pure authorization check: it never records usage. Usage is
//! recorded by the metered operation's own success path, through
//! [`crate::UsageRecorder`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use metergate_core::{Decision, DenyReason, Feature, PlanCatalog, RateLimitSettings, Subject, UserId};
use metergate_store::MeterStore;

use crate::quota::QuotaTracker;
use crate::rate_limiter::RateLimiter;

/// Enforcement facade combining the feature gate, rate limiter, and quota
/// tracker.
pub struct Gate {
    catalog: Arc<PlanCatalog>,
    limiter: RateLimiter,
    quota: QuotaTracker,
}

impl Gate {
    /// Build a gate over the shared store with an immutable catalog and
    /// limit table.
    #[must_use]
    pub fn new(
        store: Arc<dyn MeterStore>,
        catalog: Arc<PlanCatalog>,
        settings: RateLimitSettings,
    ) -> Self {
        Self {
            catalog: Arc::clone(&catalog),
            limiter: RateLimiter::new(Arc::clone(&store), settings),
            quota: QuotaTracker::new(store),
        }
    }

    /// The catalog this gate resolves plans against.
    #[must_use]
    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Authorize one metered operation, now.
    pub async fn authorize(
        &self,
        subject: Subject,
        user_id: &UserId,
        plan_id: &str,
        feature: Feature,
    ) -> Decision {
        self.authorize_at(subject, user_id, plan_id, feature, Utc::now())
            .await
    }

    /// Authorize one metered operation at an explicit instant.
    pub async fn authorize_at(
        &self,
        subject: Subject,
        user_id: &UserId,
        plan_id: &str,
        feature: Feature,
        now: DateTime<Utc>,
    ) -> Decision {
        let plan = self.catalog.resolve(plan_id);

        if !plan.allows(feature) {
            tracing::debug!(
                subject = %subject,
                plan = %plan.id,
                feature = %feature,
                "denied: feature not in plan"
            );
            return Decision::feature_not_available();
        }

        let rate_limit = self
            .limiter
            .check_and_consume_at(subject, &plan.id, now)
            .await;
        if !rate_limit.allowed {
            tracing::debug!(
                subject = %subject,
                plan = %plan.id,
                class = %rate_limit.class,
                reset_at = %rate_limit.reset_at,
                "denied: rate limited"
            );
            return Decision::rate_limited(rate_limit);
        }

        let quota = self.quota.check_quota_at(user_id, plan, feature, now).await;
        if !quota.allowed {
            tracing::debug!(
                subject = %subject,
                plan = %plan.id,
                feature = %feature,
                used = %quota.used,
                limit = %quota.limit,
                "denied: monthly quota exhausted"
            );
            return Decision {
                allowed: false,
                reason: Some(DenyReason::QuotaExceeded),
                rate_limit: Some(rate_limit),
                quota: Some(quota),
            };
        }

        Decision::allow(Some(rate_limit), Some(quota))
    }
}
