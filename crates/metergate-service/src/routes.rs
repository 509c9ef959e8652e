//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, authorize, health, plans, usage};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for authorization endpoints.
/// These sit on every metered request path, so they get the high ceiling.
const AUTHORIZE_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/plans` - Plan catalog (reference data)
///
/// ## Service API key auth
/// - `POST /v1/authorize` - Full decision for a metered operation
/// - `POST /v1/authorize/enforce` - 204 on allow, 429/403 on deny
/// - `POST /v1/usage/record` - Post-success usage recording
/// - `GET /v1/usage/:user_id` - Usage report against a plan's quotas
/// - `POST /v1/plans/proration-preview` - Pure proration preview
///
/// ## Admin key auth
/// - `POST /v1/admin/purge-windows` - Expired-window maintenance
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Authorization endpoints handle one call per inbound product request,
    // so they get their own, higher concurrency ceiling.
    let authorize_routes = Router::new()
        .route("/", post(authorize::authorize))
        .route("/enforce", post(authorize::enforce))
        .layer(ConcurrencyLimitLayer::new(AUTHORIZE_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Usage
        .route("/usage/record", post(usage::record_usage))
        .route("/usage/:user_id", get(usage::get_usage))
        // Plans
        .route("/plans", get(plans::list_plans))
        .route("/plans/proration-preview", post(plans::proration_preview))
        // Maintenance
        .route("/admin/purge-windows", post(admin::purge_windows))
        // Authorization (with its own concurrency limit)
        .nest("/authorize", authorize_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no limits)
        .route("/health", get(health::health))
        // API v1 routes
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
