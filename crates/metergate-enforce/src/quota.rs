//! Monthly quota checks.
//!
//! A quota check reads the user's current-month usage row (absent row means
//! zero usage) and compares it against the plan's limit for the feature.
//! `-1` means unlimited. The check happens before the metered operation;
//! recording happens strictly after its success, through
//! [`crate::UsageRecorder`].
//!
//! Quota reads fail open on store errors — availability wins over strict
//! enforcement for reads. Writes do not; see the recorder.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use metergate_core::{BillingMonth, Feature, Plan, QuotaStatus, UserId, UNLIMITED};
use metergate_store::MeterStore;

use crate::outage::OutageLog;

/// Monthly per-feature quota tracker.
pub struct QuotaTracker {
    store: Arc<dyn MeterStore>,
    outages: OutageLog,
}

impl QuotaTracker {
    /// Create a tracker over the shared store.
    #[must_use]
    pub fn new(store: Arc<dyn MeterStore>) -> Self {
        Self {
            store,
            outages: OutageLog::new(),
        }
    }

    /// Check the current month's quota for `feature` under `plan`.
    pub async fn check_quota(&self, user_id: &UserId, plan: &Plan, feature: Feature) -> QuotaStatus {
        self.check_quota_at(user_id, plan, feature, Utc::now())
            .await
    }

    /// Check the quota at an explicit instant (the instant picks the month).
    pub async fn check_quota_at(
        &self,
        user_id: &UserId,
        plan: &Plan,
        feature: Feature,
        now: DateTime<Utc>,
    ) -> QuotaStatus {
        let limit = plan.monthly_limit(feature);
        let month = BillingMonth::of(now);

        let used = match self.store.monthly_usage(user_id, month).await {
            Ok(row) => {
                if self.outages.note_success() {
                    tracing::info!("quota store recovered");
                }
                row.map_or(0, |r| r.used(feature))
            }
            Err(err) => {
                if self.outages.note_failure(&err.to_string()) {
                    tracing::warn!(
                        user_id = %user_id,
                        feature = %feature,
                        error = %err,
                        "quota store unreachable, failing open"
                    );
                }
                // Fail open: a quota-read outage must not block the product.
                return QuotaStatus {
                    allowed: true,
                    used: 0,
                    limit,
                };
            }
        };

        let allowed = limit == UNLIMITED || used < unsigned(limit);
        QuotaStatus {
            allowed,
            used,
            limit,
        }
    }
}

/// Non-negative limit as a `u64` (`UNLIMITED` never reaches here).
fn unsigned(limit: i64) -> u64 {
    u64::try_from(limit).unwrap_or_default()
}
