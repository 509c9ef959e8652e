//! Usage recording and reporting integration tests.

mod common;

use common::TestHarness;
use metergate_core::{BillingMonth, Feature};
use metergate_store::MeterStore;
use serde_json::json;

#[tokio::test]
async fn record_usage_creates_and_increments() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/usage/record")
        .add_header("x-api-key", &harness.service_api_key)
        .add_header("x-service-name", "content-api")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "feature": "content_generation"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["used"], 1);

    let response = harness
        .server
        .post("/v1/usage/record")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "feature": "content_generation",
            "delta": 2
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["used"], 3);
}

#[tokio::test]
async fn record_usage_zero_delta_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/usage/record")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "feature": "api_call",
            "delta": 0
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn record_usage_without_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/usage/record")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "feature": "api_call"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn usage_report_reflects_recorded_usage() {
    let harness = TestHarness::new();
    let month = BillingMonth::current();

    harness
        .store
        .record_usage(&harness.test_user_id, month, Feature::SentimentAnalysis, 7)
        .await
        .unwrap();

    let response = harness
        .server
        .get(&format!("/v1/usage/{}", harness.test_user_id))
        .add_header("x-api-key", &harness.service_api_key)
        .add_query_param("plan", "basic")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["plan_id"], "basic");
    assert_eq!(body["month"], month.to_string());

    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 5);

    let sentiment = features
        .iter()
        .find(|f| f["feature"] == "sentiment_analysis")
        .unwrap();
    assert_eq!(sentiment["used"], 7);
    assert_eq!(sentiment["limit"], 100);
    assert_eq!(sentiment["enabled"], true);

    // Basic has no summarization at all.
    let summaries = features
        .iter()
        .find(|f| f["feature"] == "summarization")
        .unwrap();
    assert_eq!(summaries["enabled"], false);
    assert_eq!(summaries["limit"], 0);
}

#[tokio::test]
async fn usage_report_for_untracked_user_is_zeroed() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("/v1/usage/{}", harness.test_user_id))
        .add_header("x-api-key", &harness.service_api_key)
        .add_query_param("plan", "enterprise")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    for feature in body["features"].as_array().unwrap() {
        assert_eq!(feature["used"], 0);
        assert_eq!(feature["limit"], -1);
    }
}
