//! Authorization handlers.
//!
//! `POST /v1/authorize` returns the full decision with 200 regardless of
//! outcome — the caller owns the mapping to its own status codes.
//! `POST /v1/authorize/enforce` applies the canonical mapping here instead:
//! 204 on allow, 429/403 with machine-readable codes on deny.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use metergate_core::{Decision, Feature, Subject, UserId};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Authorization request from a product backend.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    /// The rate-limit principal. Defaults to the user when omitted, so only
    /// API-key traffic needs to spell it out.
    #[serde(default)]
    pub subject: Option<Subject>,

    /// The user whose quota is charged.
    pub user_id: UserId,

    /// The user's current plan identifier.
    pub plan_id: String,

    /// The metered feature being exercised.
    pub feature: Feature,
}

/// Return the gate's decision for a metered operation.
pub async fn authorize(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<AuthorizeRequest>,
) -> Result<Json<Decision>, ApiError> {
    let subject = body.subject.unwrap_or_else(|| Subject::user(body.user_id));

    let decision = state
        .gate
        .authorize(subject, &body.user_id, &body.plan_id, body.feature)
        .await;

    tracing::debug!(
        service = %auth.service_name,
        subject = %subject,
        plan = %body.plan_id,
        feature = %body.feature,
        allowed = %decision.allowed,
        "Authorization decision"
    );

    Ok(Json(decision))
}

/// Authorize and translate a denial straight into a status code.
pub async fn enforce(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<AuthorizeRequest>,
) -> Result<StatusCode, ApiError> {
    let subject = body.subject.unwrap_or_else(|| Subject::user(body.user_id));

    let decision = state
        .gate
        .authorize(subject, &body.user_id, &body.plan_id, body.feature)
        .await;

    if let Some(denial) = ApiError::from_decision(&decision) {
        tracing::debug!(
            service = %auth.service_name,
            subject = %subject,
            reason = ?decision.reason,
            "Enforced denial"
        );
        return Err(denial);
    }

    Ok(StatusCode::NO_CONTENT)
}
