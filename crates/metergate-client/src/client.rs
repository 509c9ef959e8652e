//! Metergate HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use metergate_core::{Decision, Feature};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, AuthorizeRequest, ProrationPreview, ProrationPreviewRequest,
    RecordUsageRequest, RecordUsageResponse, UsageReport,
};

/// Metergate API client.
///
/// Provides methods for authorizing metered operations, recording usage,
/// and previewing plan-change proration.
#[derive(Debug, Clone)]
pub struct MetergateClient {
    client: Client,
    base_url: String,
    api_key: String,
    service_name: String,
}

/// Options for building a client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,

    /// Name reported in the `x-service-name` header.
    pub service_name: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            service_name: "unknown".to_string(),
        }
    }
}

impl MetergateClient {
    /// Create a new metergate client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the metergate service (e.g., `"http://metergate:8080"`)
    /// * `api_key` - Service API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new metergate client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            service_name: options.service_name,
        }
    }

    /// Ask the gate for the full decision on a metered operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    /// A denial is **not** an error here — inspect the returned `Decision`.
    pub async fn authorize(&self, request: AuthorizeRequest) -> Result<Decision, ClientError> {
        let url = format!("{}/v1/authorize", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Authorize and treat any denial as a typed error.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RateLimited`], [`ClientError::QuotaExceeded`],
    /// or [`ClientError::FeatureNotAvailable`] on denial, and transport or
    /// server errors otherwise.
    pub async fn enforce(&self, request: AuthorizeRequest) -> Result<(), ClientError> {
        let url = format!("{}/v1/authorize/enforce", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(self.error_from_response(response).await)
    }

    /// Record usage after a metered operation succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn record_usage(
        &self,
        user_id: impl Into<String>,
        feature: Feature,
        delta: u64,
    ) -> Result<RecordUsageResponse, ClientError> {
        let url = format!("{}/v1/usage/record", self.base_url);
        let request = RecordUsageRequest {
            user_id: user_id.into(),
            feature,
            delta,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch a user's usage report against a plan's quotas.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn usage_report(
        &self,
        user_id: &str,
        plan_id: &str,
    ) -> Result<UsageReport, ClientError> {
        let url = format!("{}/v1/usage/{user_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("plan", plan_id)])
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Preview the proration of a plan change.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn proration_preview(
        &self,
        request: ProrationPreviewRequest,
    ) -> Result<ProrationPreview, ClientError> {
        let url = format!("{}/v1/plans/proration-preview", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("x-service-name", &self.service_name)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            return Ok(response.json().await?);
        }
        Err(self.error_from_response(response).await)
    }

    /// Map an error response to a typed `ClientError`.
    async fn error_from_response(&self, response: reqwest::Response) -> ClientError {
        let status = response.status();
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let details = api_error.error.details.as_ref();

                match code {
                    "rate_limited" => ClientError::RateLimited {
                        reset_at: details
                            .and_then(|d| d.get("reset_at"))
                            .and_then(|v| v.as_str())
                            .and_then(|s| s.parse().ok()),
                    },
                    "quota_exceeded" => ClientError::QuotaExceeded {
                        used: details
                            .and_then(|d| d.get("used"))
                            .and_then(serde_json::Value::as_u64)
                            .unwrap_or(0),
                        limit: details
                            .and_then(|d| d.get("limit"))
                            .and_then(serde_json::Value::as_i64)
                            .unwrap_or(0),
                    },
                    "feature_not_available" => ClientError::FeatureNotAvailable,
                    _ => ClientError::Api {
                        code: code.to_string(),
                        message: api_error.error.message,
                        status: status.as_u16(),
                    },
                }
            }
            Err(_) => ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            },
        }
    }
}
