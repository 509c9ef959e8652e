//! In-memory storage implementation.
//!
//! The default backend for single-process deployments and the test suite.
//! Increments take the map lock for their whole read-modify-write, which
//! makes them atomic within the process; the lock is never held across an
//! await point.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};

use crate::error::Result;
use crate::keys::WindowKey;
use crate::MeterStore;

/// Mutex-protected in-memory backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: Mutex<HashMap<WindowKey, u64>>,
    usage: Mutex<HashMap<(UserId, BillingMonth), MonthlyUsage>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live window counters (test observability).
    #[must_use]
    pub fn window_count(&self) -> usize {
        lock(&self.windows).len()
    }
}

/// Lock a mutex, recovering the guard if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl MeterStore for MemoryStore {
    async fn fetch_window(&self, key: &WindowKey) -> Result<Option<u64>> {
        Ok(lock(&self.windows).get(key).copied())
    }

    async fn increment_window(&self, key: &WindowKey) -> Result<u64> {
        let mut windows = lock(&self.windows);
        let count = windows.entry(*key).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn purge_expired_windows(&self, before: DateTime<Utc>) -> Result<u64> {
        let mut windows = lock(&self.windows);
        let initial = windows.len();
        windows.retain(|key, _| key.window_end() > before.timestamp());
        Ok((initial - windows.len()) as u64)
    }

    async fn monthly_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
    ) -> Result<Option<MonthlyUsage>> {
        Ok(lock(&self.usage).get(&(*user_id, month)).cloned())
    }

    async fn record_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
        feature: Feature,
        delta: u64,
    ) -> Result<MonthlyUsage> {
        let mut usage = lock(&self.usage);
        let row = usage
            .entry((*user_id, month))
            .or_insert_with(|| MonthlyUsage::empty(*user_id, month));
        row.apply(feature, delta);
        Ok(row.clone())
    }
}
