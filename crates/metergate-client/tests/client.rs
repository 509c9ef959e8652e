//! Client SDK tests against a mocked metergate service.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metergate_client::{AuthorizeRequest, ClientError, MetergateClient, ProrationPreviewRequest};
use metergate_core::Feature;

fn authorize_request() -> AuthorizeRequest {
    AuthorizeRequest {
        subject: None,
        user_id: "3e7c2a46-1f6c-4a1a-9d9e-07b5f1c39a11".to_string(),
        plan_id: "professional".to_string(),
        feature: Feature::ContentGeneration,
    }
}

#[tokio::test]
async fn authorize_parses_the_decision() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/authorize"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "allowed": true,
            "rate_limit": {
                "allowed": true,
                "class": "minute",
                "limit": 100,
                "remaining": 99,
                "reset_at": "2026-08-07T10:01:00Z"
            },
            "quota": { "allowed": true, "used": 3, "limit": 500 }
        })))
        .mount(&server)
        .await;

    let client = MetergateClient::new(server.uri(), "secret");
    let decision = client.authorize(authorize_request()).await.unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.rate_limit.unwrap().remaining, 99);
    assert_eq!(decision.quota.unwrap().used, 3);
}

#[tokio::test]
async fn enforce_maps_rate_limit_denial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/authorize/enforce"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": "rate_limited",
                "message": "Rate limit exceeded",
                "details": { "reset_at": "2026-08-07T10:01:00Z" }
            }
        })))
        .mount(&server)
        .await;

    let client = MetergateClient::new(server.uri(), "secret");
    let err = client.enforce(authorize_request()).await.unwrap_err();

    assert!(err.is_denial());
    match err {
        ClientError::RateLimited { reset_at } => assert!(reset_at.is_some()),
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn enforce_maps_quota_denial() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/authorize/enforce"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": "quota_exceeded",
                "message": "Monthly quota exceeded",
                "details": { "used": 5, "limit": 5 }
            }
        })))
        .mount(&server)
        .await;

    let client = MetergateClient::new(server.uri(), "secret");
    let err = client.enforce(authorize_request()).await.unwrap_err();

    match err {
        ClientError::QuotaExceeded { used, limit } => {
            assert_eq!(used, 5);
            assert_eq!(limit, 5);
        }
        other => panic!("expected QuotaExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn record_usage_posts_with_service_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/usage/record"))
        .and(header("x-api-key", "secret"))
        .and(header("x-service-name", "content-api"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "month": "2026-08", "used": 4 })),
        )
        .mount(&server)
        .await;

    let client = MetergateClient::with_options(
        server.uri(),
        "secret",
        metergate_client::ClientOptions {
            timeout_seconds: 5,
            service_name: "content-api".to_string(),
        },
    );
    let response = client
        .record_usage("user-uuid", Feature::ContentGeneration, 1)
        .await
        .unwrap();

    assert_eq!(response.month, "2026-08");
    assert_eq!(response.used, 4);
}

#[tokio::test]
async fn proration_preview_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/plans/proration-preview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credit_cents": 500,
            "charge_cents": 5000,
            "net_cents": 4500,
            "days_remaining": 15,
            "cycle_days": 30
        })))
        .mount(&server)
        .await;

    let client = MetergateClient::new(server.uri(), "secret");
    let preview = client
        .proration_preview(ProrationPreviewRequest {
            current_plan: "basic".to_string(),
            new_plan: "enterprise".to_string(),
            cycle_end: None,
            days_remaining: Some(15),
        })
        .await
        .unwrap();

    assert_eq!(preview.net_cents, 4500);
    assert_eq!(preview.credit_cents, 500);
}

#[tokio::test]
async fn unparseable_error_body_degrades_gracefully() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/authorize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = MetergateClient::new(server.uri(), "secret");
    let err = client.authorize(authorize_request()).await.unwrap_err();

    match err {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "unknown");
            assert_eq!(status, 500);
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
