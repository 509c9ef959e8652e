//! Authorization endpoint integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use metergate_core::{PlanRate, RateLimitSettings};
use serde_json::json;

fn tight_settings() -> RateLimitSettings {
    RateLimitSettings::default().with_rate(
        "professional",
        PlanRate {
            per_minute: 2,
            per_hour: 100,
        },
    )
}

#[tokio::test]
async fn authorize_allows_within_limits() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/authorize")
        .add_header("x-api-key", &harness.service_api_key)
        .add_header("x-service-name", "content-api")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "professional",
            "feature": "summarization"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], true);
    assert!(body.get("reason").is_none());
    // Professional: 100/minute, first call leaves 99.
    assert_eq!(body["rate_limit"]["remaining"], 99);
    assert_eq!(body["quota"]["used"], 0);
    assert_eq!(body["quota"]["limit"], 500);
}

#[tokio::test]
async fn authorize_without_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/authorize")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "free",
            "feature": "content_generation"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn free_plan_denies_gated_feature() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/authorize")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "free",
            "feature": "sentiment_analysis"
        }))
        .await;

    // A denial is still a 200 with a structured decision.
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "feature_not_available");
}

#[tokio::test]
async fn unknown_plan_falls_back_to_free_limits() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/authorize")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "plan-from-a-deleted-tier",
            "feature": "api_call"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "feature_not_available");
}

#[tokio::test]
async fn rate_limit_denies_with_reset_time() {
    let harness = TestHarness::with_settings(tight_settings());

    for _ in 0..2 {
        let response = harness
            .server
            .post("/v1/authorize")
            .add_header("x-api-key", &harness.service_api_key)
            .json(&json!({
                "user_id": harness.test_user_id.to_string(),
                "plan_id": "professional",
                "feature": "content_generation"
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["allowed"], true);
    }

    let response = harness
        .server
        .post("/v1/authorize")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "professional",
            "feature": "content_generation"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], false);
    assert_eq!(body["reason"], "rate_limited");
    assert_eq!(body["rate_limit"]["remaining"], 0);
    assert!(body["rate_limit"]["reset_at"].is_string());
}

#[tokio::test]
async fn api_key_subjects_are_limited_separately() {
    let harness = TestHarness::with_settings(tight_settings());
    let api_key_subject = format!("api-key:{}", uuid::Uuid::new_v4());

    // Exhaust the user subject's minute window.
    for _ in 0..2 {
        harness
            .server
            .post("/v1/authorize")
            .add_header("x-api-key", &harness.service_api_key)
            .json(&json!({
                "user_id": harness.test_user_id.to_string(),
                "plan_id": "professional",
                "feature": "api_call"
            }))
            .await
            .assert_status_ok();
    }

    // The same user's API key has its own untouched window.
    let response = harness
        .server
        .post("/v1/authorize")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "subject": api_key_subject,
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "professional",
            "feature": "api_call"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["allowed"], true);
}

// ============================================================================
// Enforced variant: denials become status codes
// ============================================================================

#[tokio::test]
async fn enforce_returns_no_content_on_allow() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/authorize/enforce")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "enterprise",
            "feature": "summarization"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn enforce_maps_rate_limit_to_429_with_retry_after() {
    let harness = TestHarness::with_settings(tight_settings());

    for _ in 0..2 {
        harness
            .server
            .post("/v1/authorize/enforce")
            .add_header("x-api-key", &harness.service_api_key)
            .json(&json!({
                "user_id": harness.test_user_id.to_string(),
                "plan_id": "professional",
                "feature": "content_generation"
            }))
            .await;
    }

    let response = harness
        .server
        .post("/v1/authorize/enforce")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "professional",
            "feature": "content_generation"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get("retry-after").is_some());
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "rate_limited");
    assert!(body["error"]["details"]["reset_at"].is_string());
}

#[tokio::test]
async fn enforce_maps_feature_gate_to_403() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/authorize/enforce")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "basic",
            "feature": "summarization"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "feature_not_available");
}

#[tokio::test]
async fn enforce_maps_exhausted_quota_to_403() {
    let harness = TestHarness::new();

    // Burn the free plan's five monthly content generations.
    for _ in 0..5 {
        harness
            .server
            .post("/v1/usage/record")
            .add_header("x-api-key", &harness.service_api_key)
            .json(&json!({
                "user_id": harness.test_user_id.to_string(),
                "feature": "content_generation"
            }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .post("/v1/authorize/enforce")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "plan_id": "free",
            "feature": "content_generation"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "quota_exceeded");
    assert_eq!(body["error"]["details"]["used"], 5);
    assert_eq!(body["error"]["details"]["limit"], 5);
}
