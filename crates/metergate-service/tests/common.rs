//! Common test utilities for metergate integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;

use metergate_core::{PlanCatalog, RateLimitSettings, UserId};
use metergate_service::{create_router, AppState, ServiceConfig};
use metergate_store::MemoryStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The in-memory store behind the service (for direct inspection).
    pub store: Arc<MemoryStore>,
    /// A test user ID for requests.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
    /// The admin API key for maintenance requests.
    pub admin_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with the default rate-limit table.
    pub fn new() -> Self {
        Self::with_settings(RateLimitSettings::default())
    }

    /// Create a harness with a custom rate-limit table.
    pub fn with_settings(settings: RateLimitSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let service_api_key = "test-service-key".to_string();
        let admin_api_key = "test-admin-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            service_api_key: Some(service_api_key.clone()),
            admin_api_key: Some(admin_api_key.clone()),
            ..ServiceConfig::default()
        };

        let state = AppState::new(store.clone(), PlanCatalog::builtin(), settings, config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            store,
            test_user_id,
            service_api_key,
            admin_api_key,
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
