//! Maintenance handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use metergate_store::MeterStore;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Purge response.
#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    /// Number of expired window counters removed.
    pub removed: u64,
}

/// Delete window counters whose window has ended.
///
/// Stale counters never affect correctness (new windows use fresh keys);
/// this only reclaims space. The background sweeper does the same on a
/// timer — the endpoint exists for operators who want it now.
pub async fn purge_windows(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
) -> Result<Json<PurgeResponse>, ApiError> {
    let removed = state.store.purge_expired_windows(Utc::now()).await?;

    tracing::info!(
        admin_id = %auth.admin_id,
        removed = %removed,
        "Purged expired window counters"
    );

    Ok(Json(PurgeResponse { removed }))
}
