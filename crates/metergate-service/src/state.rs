//! Application state.

use std::sync::Arc;

use metergate_core::{PlanCatalog, RateLimitSettings};
use metergate_enforce::{Gate, UsageRecorder};
use metergate_store::MeterStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn MeterStore>,

    /// The immutable plan catalog.
    pub catalog: Arc<PlanCatalog>,

    /// The enforcement facade.
    pub gate: Arc<Gate>,

    /// Post-success usage recorder.
    pub recorder: Arc<UsageRecorder>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn MeterStore>,
        catalog: PlanCatalog,
        settings: RateLimitSettings,
        config: ServiceConfig,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let gate = Arc::new(Gate::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            settings,
        ));
        let recorder = Arc::new(UsageRecorder::new(Arc::clone(&store)));

        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not configured - service endpoints will reject all requests");
        }
        if config.admin_api_key.is_none() {
            tracing::warn!("ADMIN_API_KEY not configured - maintenance endpoints disabled");
        }

        Self {
            store,
            catalog,
            gate,
            recorder,
            config,
        }
    }
}
