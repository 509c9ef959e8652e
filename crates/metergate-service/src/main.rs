//! Metergate Service - HTTP API for quota and rate-limit enforcement
//!
//! This is the main entry point for the metergate service.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metergate_core::PlanCatalog;
use metergate_service::{create_router, AppState, ServiceConfig};
use metergate_service::config::JsonPlanSource;
use metergate_store::{MemoryStore, MeterStore, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,metergate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Metergate Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        postgres_configured = %config.database_url.is_some(),
        data_dir = ?config.data_dir,
        sweep_interval_seconds = %config.sweep_interval_seconds,
        "Service configuration loaded"
    );

    // Pick the counter store backend
    let store = build_store(&config).await?;

    // Load the plan catalog (immutable once built)
    let catalog = match &config.plans_file {
        Some(path) => {
            let source = JsonPlanSource::new(path.clone());
            let catalog = PlanCatalog::from_source(&source)?;
            tracing::info!(path = %path, "Loaded plan catalog from file");
            catalog
        }
        None => PlanCatalog::builtin(),
    };

    // Rate-limit table (builtin defaults plus optional file overrides)
    let settings = config.rate_limit_settings()?;

    // Background GC for expired window counters
    spawn_window_sweeper(
        Arc::clone(&store),
        Duration::from_secs(config.sweep_interval_seconds),
    );

    // Build app state
    let state = AppState::new(store, catalog, settings, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Select and open the counter store backend.
async fn build_store(
    config: &ServiceConfig,
) -> Result<Arc<dyn MeterStore>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.database_url {
        tracing::info!("Opening PostgreSQL counter store");
        let store = PgStore::connect(url).await?;
        store.migrate().await?;
        return Ok(Arc::new(store));
    }

    #[cfg(feature = "rocksdb-backend")]
    if let Some(dir) = &config.data_dir {
        tracing::info!(path = %dir, "Opening RocksDB counter store");
        return Ok(Arc::new(metergate_store::RocksStore::open(dir)?));
    }

    #[cfg(not(feature = "rocksdb-backend"))]
    if config.data_dir.is_some() {
        tracing::warn!(
            "DATA_DIR set but the rocksdb-backend feature is disabled; using the in-memory store"
        );
    }

    tracing::info!("Using in-memory counter store (single-process only)");
    Ok(Arc::new(MemoryStore::new()))
}

/// Periodically delete expired window counters.
///
/// Correctness never depends on this: new windows use fresh keys. The sweep
/// only keeps the counter table from growing without bound.
fn spawn_window_sweeper(store: Arc<dyn MeterStore>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so startup stays quiet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.purge_expired_windows(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(removed = %removed, "Swept expired window counters");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Window sweep failed");
                }
            }
        }
    });
}
