//! Request and response types for the metergate client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metergate_core::Feature;

/// Authorization request for a metered operation.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeRequest {
    /// The rate-limit principal (`user:<uuid>` or `api-key:<uuid>`).
    /// Defaults to the user when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The user whose quota is charged.
    pub user_id: String,

    /// The user's current plan identifier.
    pub plan_id: String,

    /// The metered feature being exercised.
    pub feature: Feature,
}

/// Usage recording request, sent after the operation succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct RecordUsageRequest {
    /// The user whose quota was consumed.
    pub user_id: String,

    /// The feature that was exercised.
    pub feature: Feature,

    /// How many uses to record.
    pub delta: u64,
}

/// Usage recording response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordUsageResponse {
    /// The month the increment landed in (`YYYY-MM`).
    pub month: String,

    /// The feature's counter after the increment.
    pub used: u64,
}

/// One feature's row in the usage report.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureUsage {
    /// The metered feature.
    pub feature: Feature,

    /// Whether the plan enables the feature at all.
    pub enabled: bool,

    /// Uses so far this month.
    pub used: u64,

    /// The plan's monthly limit (`-1` = unlimited).
    pub limit: i64,
}

/// Usage report response.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageReport {
    /// The user the report covers.
    pub user_id: String,

    /// The reported month (`YYYY-MM`).
    pub month: String,

    /// The plan quotas were evaluated against.
    pub plan_id: String,

    /// Per-feature usage against the plan's limits.
    pub features: Vec<FeatureUsage>,
}

/// Proration preview request for a mid-cycle plan change.
#[derive(Debug, Clone, Serialize)]
pub struct ProrationPreviewRequest {
    /// The subscription's current plan.
    pub current_plan: String,

    /// The plan being switched to.
    pub new_plan: String,

    /// End of the current billing cycle, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_end: Option<DateTime<Utc>>,

    /// Explicit days remaining; overrides `cycle_end` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

/// Proration preview response.
#[derive(Debug, Clone, Deserialize)]
pub struct ProrationPreview {
    /// Value of unused time on the old plan, in cents.
    pub credit_cents: i64,

    /// Cost of the remaining time at the new rate, in cents.
    pub charge_cents: i64,

    /// `charge - credit`; positive for an upgrade.
    pub net_cents: i64,

    /// The days the calculation covered (after clamping).
    pub days_remaining: i64,

    /// The cycle length used.
    pub cycle_days: i64,
}

/// Error response body from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// The error payload.
    pub error: ApiErrorBody,
}

/// Error details from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Stable machine-readable code.
    pub code: String,

    /// Human-readable message.
    pub message: String,

    /// Optional structured details.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
