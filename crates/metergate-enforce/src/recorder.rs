//! Post-success usage recording.
//!
//! Recording happens only after the metered operation has completed, so a
//! failed downstream call never consumes quota. The write path is the one
//! place that does **not** fail open: silently dropping an increment causes
//! under-billing, so failures are retried with exponential backoff and the
//! final failure is logged as an error, never swallowed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};
use metergate_store::{MeterStore, StoreError};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of attempts for a usage write.
const RECORD_MAX_ATTEMPTS: u32 = 4;

/// Initial backoff duration (doubles with each attempt).
const RECORD_INITIAL_BACKOFF_MS: u64 = 100;

/// Maximum backoff duration between attempts.
const RECORD_MAX_BACKOFF_MS: u64 = 5_000;

/// Records usage increments with retries.
pub struct UsageRecorder {
    store: Arc<dyn MeterStore>,
}

impl UsageRecorder {
    /// Create a recorder over the shared store.
    #[must_use]
    pub fn new(store: Arc<dyn MeterStore>) -> Self {
        Self { store }
    }

    /// Record `delta` uses of `feature` for the current month.
    ///
    /// # Errors
    ///
    /// Returns the last store error once every retry is exhausted.
    pub async fn record(
        &self,
        user_id: &UserId,
        feature: Feature,
        delta: u64,
    ) -> Result<MonthlyUsage, StoreError> {
        self.record_at(user_id, feature, delta, Utc::now()).await
    }

    /// Record usage at an explicit instant (the instant picks the month).
    ///
    /// # Errors
    ///
    /// Returns the last store error once every retry is exhausted.
    pub async fn record_at(
        &self,
        user_id: &UserId,
        feature: Feature,
        delta: u64,
        now: DateTime<Utc>,
    ) -> Result<MonthlyUsage, StoreError> {
        let month = BillingMonth::of(now);
        let mut backoff_ms = RECORD_INITIAL_BACKOFF_MS;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.store.record_usage(user_id, month, feature, delta).await {
                Ok(row) => {
                    tracing::debug!(
                        user_id = %user_id,
                        feature = %feature,
                        delta = %delta,
                        used = %row.used(feature),
                        "usage recorded"
                    );
                    return Ok(row);
                }
                Err(err) if attempt < RECORD_MAX_ATTEMPTS => {
                    tracing::debug!(
                        user_id = %user_id,
                        feature = %feature,
                        attempt = %attempt,
                        backoff_ms = %backoff_ms,
                        error = %err,
                        "usage write failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(RECORD_MAX_BACKOFF_MS);
                }
                Err(err) => {
                    tracing::error!(
                        user_id = %user_id,
                        feature = %feature,
                        delta = %delta,
                        attempts = %RECORD_MAX_ATTEMPTS,
                        error = %err,
                        "usage write failed after all retries; increment lost"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Record without blocking the caller's response path.
    ///
    /// Spawns the retrying write onto the runtime; the caller keeps only the
    /// guarantee that a final failure lands in the error log.
    pub fn record_detached(self: &Arc<Self>, user_id: UserId, feature: Feature, delta: u64) {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            // record() already logs the terminal failure.
            let _ = recorder.record(&user_id, feature, delta).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FlakyStore;
    use metergate_store::MemoryStore;

    #[tokio::test]
    async fn records_into_the_current_month() {
        let store = Arc::new(MemoryStore::new());
        let recorder = UsageRecorder::new(store.clone());
        let user = UserId::generate();

        let row = recorder
            .record(&user, Feature::KeywordExtraction, 2)
            .await
            .unwrap();
        assert_eq!(row.keywords_used, 2);
        assert_eq!(row.month, BillingMonth::current());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_the_write_lands() {
        let store = FlakyStore::failing(2);
        let recorder = UsageRecorder::new(store.clone());
        let user = UserId::generate();

        let row = recorder
            .record(&user, Feature::ContentGeneration, 1)
            .await
            .unwrap();

        assert_eq!(row.content_generated, 1);
        assert_eq!(store.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_the_error() {
        let store = FlakyStore::failing(u32::MAX);
        let recorder = UsageRecorder::new(store.clone());
        let user = UserId::generate();

        let result = recorder.record(&user, Feature::ApiCall, 1).await;

        assert!(result.is_err());
        assert_eq!(store.attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn detached_write_lands_eventually() {
        let store = FlakyStore::failing(1);
        let recorder = Arc::new(UsageRecorder::new(store.clone()));
        let user = UserId::generate();

        recorder.record_detached(user, Feature::Summarization, 1);

        // Paused-clock runtime: sleeping lets the timer auto-advance drive
        // the spawned retry to completion.
        let row = loop {
            if let Some(row) = store
                .monthly_usage(&user, BillingMonth::current())
                .await
                .unwrap()
            {
                break row;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        };
        assert_eq!(row.summaries_used, 1);
        assert_eq!(store.attempts(), 2);
    }
}
