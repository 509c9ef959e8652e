//! Service configuration.

use std::collections::HashMap;
use std::path::Path;

use metergate_core::{CoreError, Plan, PlanRate, PlanSource, RateLimitSettings};

/// Default billing cycle length in days for proration previews.
const DEFAULT_CYCLE_DAYS: i64 = metergate_core::DEFAULT_CYCLE_DAYS;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// `PostgreSQL` connection URL. When set, counters live in Postgres.
    pub database_url: Option<String>,

    /// Path to a `RocksDB` data directory. Used when the `rocksdb-backend`
    /// feature is enabled and no database URL is set.
    pub data_dir: Option<String>,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// Admin API key for maintenance endpoints.
    pub admin_api_key: Option<String>,

    /// Optional JSON file overriding the builtin plan catalog.
    pub plans_file: Option<String>,

    /// Optional JSON file overriding per-plan request rates.
    pub rates_file: Option<String>,

    /// Billing cycle length used by proration previews.
    pub cycle_days: i64,

    /// How often the expired-window sweeper runs, in seconds.
    pub sweep_interval_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: std::env::var("DATABASE_URL").ok(),
            data_dir: std::env::var("DATA_DIR").ok(),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            plans_file: std::env::var("PLANS_FILE").ok(),
            rates_file: std::env::var("RATES_FILE").ok(),
            cycle_days: std::env::var("BILLING_CYCLE_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CYCLE_DAYS),
            sweep_interval_seconds: std::env::var("SWEEP_INTERVAL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Build the rate-limit table: builtin defaults plus any file overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the rates file exists but cannot be parsed.
    pub fn rate_limit_settings(&self) -> Result<RateLimitSettings, CoreError> {
        let mut settings = RateLimitSettings::default();
        if let Some(path) = &self.rates_file {
            let overrides: HashMap<String, PlanRate> = load_json_file(path)
                .map_err(|e| CoreError::Configuration(format!("rates file {path}: {e}")))?;
            for (plan_id, rate) in overrides {
                settings = settings.with_rate(plan_id, rate);
            }
            tracing::info!(path = %path, "Loaded rate overrides");
        }
        Ok(settings)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            data_dir: None,
            service_api_key: None,
            admin_api_key: None,
            plans_file: None,
            rates_file: None,
            cycle_days: DEFAULT_CYCLE_DAYS,
            sweep_interval_seconds: 300,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

/// Plan source backed by a JSON file containing a plan array.
#[derive(Debug, Clone)]
pub struct JsonPlanSource {
    path: String,
}

impl JsonPlanSource {
    /// Create a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PlanSource for JsonPlanSource {
    fn list_plans(&self) -> Result<Vec<Plan>, CoreError> {
        load_json_file(&self.path)
            .map_err(|e| CoreError::Configuration(format!("plans file {}: {e}", self.path)))
    }
}

/// Load and parse a JSON file.
fn load_json_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
