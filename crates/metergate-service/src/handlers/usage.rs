//! Usage recording and reporting handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};
use metergate_store::MeterStore;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Usage recording request, sent after a metered operation succeeded.
#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    /// The user whose quota was consumed.
    pub user_id: UserId,

    /// The feature that was exercised.
    pub feature: Feature,

    /// How many uses to record.
    #[serde(default = "default_delta")]
    pub delta: u64,
}

const fn default_delta() -> u64 {
    1
}

/// Usage recording response.
#[derive(Debug, Serialize)]
pub struct RecordUsageResponse {
    /// The month the increment landed in.
    pub month: BillingMonth,

    /// The feature's counter after the increment.
    pub used: u64,
}

/// Record usage for a completed metered operation.
///
/// Callers invoke this only after the operation succeeded, so a failed
/// downstream call never consumes quota. The write is retried internally;
/// a terminal failure surfaces as 503 and is logged loudly rather than
/// silently dropped.
pub async fn record_usage(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<RecordUsageRequest>,
) -> Result<Json<RecordUsageResponse>, ApiError> {
    if body.delta == 0 {
        return Err(ApiError::BadRequest("delta must be at least 1".into()));
    }

    let row = state
        .recorder
        .record(&body.user_id, body.feature, body.delta)
        .await?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %body.user_id,
        feature = %body.feature,
        delta = %body.delta,
        used = %row.used(body.feature),
        "Usage recorded"
    );

    Ok(Json(RecordUsageResponse {
        month: row.month,
        used: row.used(body.feature),
    }))
}

/// Query string for the usage report.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    /// Plan to evaluate quotas against (defaults to `free`).
    pub plan: Option<String>,

    /// Month to report (defaults to the current month).
    pub month: Option<BillingMonth>,
}

/// One feature's row in the usage report.
#[derive(Debug, Serialize)]
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
#[derive(Debug, Serialize)]
pub struct UsageReport {
    /// The user the report covers.
    pub user_id: UserId,

    /// The reported month.
    pub month: BillingMonth,

    /// The plan quotas were evaluated against.
    pub plan_id: String,

    /// Per-feature usage against the plan's limits.
    pub features: Vec<FeatureUsage>,
}

/// Report a user's usage for a month against a plan's quotas.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(user_id): Path<UserId>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<UsageReport>, ApiError> {
    let month = query.month.unwrap_or_else(BillingMonth::current);
    let plan = state
        .catalog
        .resolve(query.plan.as_deref().unwrap_or("free"));

    let row = state
        .store
        .monthly_usage(&user_id, month)
        .await?
        .unwrap_or_else(|| MonthlyUsage::empty(user_id, month));

    let features = Feature::ALL
        .into_iter()
        .map(|feature| FeatureUsage {
            feature,
            enabled: plan.allows(feature),
            used: row.used(feature),
            limit: plan.monthly_limit(feature),
        })
        .collect();

    Ok(Json(UsageReport {
        user_id,
        month,
        plan_id: plan.id.clone(),
        features,
    }))
}
