//! Counter storage for metergate.
//!
//! This crate defines the backing-store contract the enforcement core
//! depends on, plus three implementations:
//!
//! - [`MemoryStore`] — mutex-protected in-memory maps, for single-process
//!   deployments and tests
//! - [`PgStore`] — PostgreSQL via sqlx, using `INSERT ... ON CONFLICT DO
//!   UPDATE SET count = count + 1` for true atomic increments
//! - [`RocksStore`] — RocksDB with an associative `add` merge operator,
//!   behind the `rocksdb-backend` feature
//!
//! # Contract
//!
//! The store holds two kinds of state:
//!
//! - **Window counters**: `(subject, limit_class, window_start, window_size)`
//!   → count. Created lazily on first increment; logically expired once the
//!   window ends; garbage-collected asynchronously via
//!   [`MeterStore::purge_expired_windows`] without affecting correctness
//!   (new windows use fresh keys).
//! - **Monthly usage**: one row per user per calendar month with one counter
//!   per metered feature.
//!
//! All mutation goes through the backend's atomic increment/upsert
//! primitive — never read-modify-write-overwrite — so concurrent callers
//! cannot lose updates and under-count usage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
pub mod postgres;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;

pub use error::{Result, StoreError};
pub use keys::WindowKey;
pub use memory::MemoryStore;
pub use postgres::PgStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};

/// The storage contract for window counters and monthly usage.
///
/// Implementations must be safe for many concurrent callers across possibly
/// many processes. Increments must be atomic; a backend without an atomic
/// increment primitive cannot satisfy this trait correctly.
#[async_trait]
pub trait MeterStore: Send + Sync {
    // =========================================================================
    // Window Counters
    // =========================================================================

    /// Read the current count for a window, if the counter exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or fails.
    async fn fetch_window(&self, key: &WindowKey) -> Result<Option<u64>>;

    /// Atomically increment a window counter, creating it at zero first if
    /// absent. Returns the count after the increment.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or fails.
    async fn increment_window(&self, key: &WindowKey) -> Result<u64>;

    /// Delete counters whose window ended at or before `before`.
    ///
    /// Maintenance only: expired counters are never read (new windows use
    /// fresh keys), so this can run at any cadence. Returns the number of
    /// counters removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or fails.
    async fn purge_expired_windows(&self, before: DateTime<Utc>) -> Result<u64>;

    // =========================================================================
    // Monthly Usage
    // =========================================================================

    /// Read a user's usage row for a month. Absent means no metered use yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or fails.
    async fn monthly_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
    ) -> Result<Option<MonthlyUsage>>;

    /// Atomically add `delta` to one feature counter of a user's monthly
    /// row, creating the row zeroed first if absent. Returns the row after
    /// the update.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or fails.
    async fn record_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
        feature: Feature,
        delta: u64,
    ) -> Result<MonthlyUsage>;
}
