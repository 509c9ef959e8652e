//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};
use metergate_store::{MemoryStore, MeterStore, Result, StoreError, WindowKey};

/// A store whose every call fails with the same message.
pub struct BrokenStore {
    message: String,
}

impl BrokenStore {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    fn err(&self) -> StoreError {
        StoreError::Unavailable(self.message.clone())
    }
}

#[async_trait]
impl MeterStore for BrokenStore {
    async fn fetch_window(&self, _key: &WindowKey) -> Result<Option<u64>> {
        Err(self.err())
    }

    async fn increment_window(&self, _key: &WindowKey) -> Result<u64> {
        Err(self.err())
    }

    async fn purge_expired_windows(&self, _before: DateTime<Utc>) -> Result<u64> {
        Err(self.err())
    }

    async fn monthly_usage(
        &self,
        _user_id: &UserId,
        _month: BillingMonth,
    ) -> Result<Option<MonthlyUsage>> {
        Err(self.err())
    }

    async fn record_usage(
        &self,
        _user_id: &UserId,
        _month: BillingMonth,
        _feature: Feature,
        _delta: u64,
    ) -> Result<MonthlyUsage> {
        Err(self.err())
    }
}

/// A store whose writes fail the first `failures` times, then delegate to an
/// in-memory store. Reads always delegate.
pub struct FlakyStore {
    inner: MemoryStore,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl FlakyStore {
    pub fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            failures_left: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeterStore for FlakyStore {
    async fn fetch_window(&self, key: &WindowKey) -> Result<Option<u64>> {
        self.inner.fetch_window(key).await
    }

    async fn increment_window(&self, key: &WindowKey) -> Result<u64> {
        self.inner.increment_window(key).await
    }

    async fn purge_expired_windows(&self, before: DateTime<Utc>) -> Result<u64> {
        self.inner.purge_expired_windows(before).await
    }

    async fn monthly_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
    ) -> Result<Option<MonthlyUsage>> {
        self.inner.monthly_usage(user_id, month).await
    }

    async fn record_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
        feature: Feature,
        delta: u64,
    ) -> Result<MonthlyUsage> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("write timed out".to_string()));
        }
        self.inner.record_usage(user_id, month, feature, delta).await
    }
}
