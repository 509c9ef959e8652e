//! Plan catalog and proration preview handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use metergate_core::{calculate_proration, days_remaining_in_cycle, Plan, ProrationResult};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// List the plan catalog, cheapest first.
pub async fn list_plans(State(state): State<Arc<AppState>>) -> Json<Vec<Plan>> {
    Json(state.catalog.plans().into_iter().cloned().collect())
}

/// Proration preview request for a mid-cycle plan change.
#[derive(Debug, Deserialize)]
pub struct ProrationPreviewRequest {
    /// The subscription's current plan.
    pub current_plan: String,

    /// The plan being switched to.
    pub new_plan: String,

    /// End of the current billing cycle. Absent means the cycle just
    /// started and the full cycle remains.
    pub cycle_end: Option<DateTime<Utc>>,

    /// Explicit days remaining; overrides `cycle_end` when present.
    pub days_remaining: Option<i64>,
}

/// Proration preview response.
#[derive(Debug, Serialize)]
pub struct ProrationPreviewResponse {
    /// The prorated amounts in cents.
    #[serde(flatten)]
    pub result: ProrationResult,

    /// The days the calculation covered (after clamping).
    pub days_remaining: i64,

    /// The cycle length used.
    pub cycle_days: i64,
}

/// Preview the net adjustment of a plan change.
///
/// Pure arithmetic over the catalog: identical input yields identical
/// output, so this preview and the billing glue can never disagree. Nothing
/// is charged here — applying the adjustment is the payment integration's
/// concern.
pub async fn proration_preview(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<ProrationPreviewRequest>,
) -> Result<Json<ProrationPreviewResponse>, ApiError> {
    let cycle_days = state.config.cycle_days;
    let days_remaining = body
        .days_remaining
        .unwrap_or_else(|| days_remaining_in_cycle(body.cycle_end, Utc::now(), cycle_days))
        .clamp(0, cycle_days);

    let old_plan = state.catalog.resolve(&body.current_plan);
    let new_plan = state.catalog.resolve(&body.new_plan);
    let result = calculate_proration(old_plan, new_plan, days_remaining, cycle_days);

    tracing::debug!(
        current_plan = %old_plan.id,
        new_plan = %new_plan.id,
        days_remaining = %days_remaining,
        net_cents = %result.net_cents,
        "Proration preview"
    );

    Ok(Json(ProrationPreviewResponse {
        result,
        days_remaining,
        cycle_days,
    }))
}
