//! `RocksDB` storage implementation.
//!
//! Counters are fixed-width little-endian `u64` lanes merged with an
//! associative `add` operator, so increments are atomic inside the engine:
//! a merge is applied even when two writers race on the same key. Window
//! counters are single-lane cells; monthly usage rows are five-lane cells,
//! one lane per metered feature.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MergeOperands,
    MultiThreaded, Options,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};

use crate::error::{Result, StoreError};
use crate::keys::{usage_key, WindowKey};
use crate::MeterStore;

/// Column family names for the `RocksDB` database.
mod cf {
    /// Window counters, keyed by the encoded `WindowKey`.
    pub const WINDOW_COUNTERS: &str = "window_counters";

    /// Monthly usage rows, keyed by `user_id/month`.
    pub const MONTHLY_USAGE: &str = "monthly_usage";
}

/// Returns all column family names for database initialization.
fn all_column_families() -> Vec<&'static str> {
    vec![cf::WINDOW_COUNTERS, cf::MONTHLY_USAGE]
}

/// Lane count of a monthly-usage cell, one per metered feature.
const USAGE_LANES: usize = 5;

/// Element-wise addition of little-endian `u64` lanes.
///
/// Operands of different lane counts are summed up to the longer length, so
/// a single-lane delta merges cleanly into a five-lane row.
fn add_merge(_key: &[u8], existing: Option<&[u8]>, operands: &MergeOperands) -> Option<Vec<u8>> {
    let mut lanes: Vec<u64> = Vec::new();
    let mut absorb = |value: &[u8]| {
        for (lane, chunk) in value.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            let add = u64::from_le_bytes(bytes);
            if lane < lanes.len() {
                lanes[lane] = lanes[lane].saturating_add(add);
            } else {
                lanes.push(add);
            }
        }
    };

    if let Some(value) = existing {
        absorb(value);
    }
    for operand in operands {
        absorb(operand);
    }

    let mut out = Vec::with_capacity(lanes.len() * 8);
    for lane in lanes {
        out.extend_from_slice(&lane.to_le_bytes());
    }
    Some(out)
}

fn decode_u64(value: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let len = value.len().min(8);
    bytes[..len].copy_from_slice(&value[..len]);
    u64::from_le_bytes(bytes)
}

fn decode_lanes(value: &[u8]) -> [u64; USAGE_LANES] {
    let mut lanes = [0u64; USAGE_LANES];
    for (lane, chunk) in value.chunks(8).take(USAGE_LANES).enumerate() {
        let mut bytes = [0u8; 8];
        bytes[..chunk.len()].copy_from_slice(chunk);
        lanes[lane] = u64::from_le_bytes(bytes);
    }
    lanes
}

const fn usage_lane(feature: Feature) -> usize {
    match feature {
        Feature::ContentGeneration => 0,
        Feature::SentimentAnalysis => 1,
        Feature::KeywordExtraction => 2,
        Feature::Summarization => 3,
        Feature::ApiCall => 4,
    }
}

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_merge_operator_associative("add_u64_lanes", add_merge);
                ColumnFamilyDescriptor::new(name, cf_opts)
            })
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }
}

#[async_trait]
impl MeterStore for RocksStore {
    async fn fetch_window(&self, key: &WindowKey) -> Result<Option<u64>> {
        let cf = self.cf(cf::WINDOW_COUNTERS)?;
        let value = self
            .db
            .get_cf(&cf, key.encode())
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(value.map(|v| decode_u64(&v)))
    }

    async fn increment_window(&self, key: &WindowKey) -> Result<u64> {
        let cf = self.cf(cf::WINDOW_COUNTERS)?;
        let encoded = key.encode();

        self.db
            .merge_cf(&cf, &encoded, 1u64.to_le_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?;

        // The read-back may include concurrent increments, which only makes
        // the reported count more conservative, never smaller.
        let value = self
            .db
            .get_cf(&cf, &encoded)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or_else(|| StoreError::Database("merged counter missing".to_string()))?;
        Ok(decode_u64(&value))
    }

    async fn purge_expired_windows(&self, before: DateTime<Utc>) -> Result<u64> {
        let cf = self.cf(cf::WINDOW_COUNTERS)?;
        let cutoff = before.timestamp();
        let mut removed = 0u64;

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let Some(window) = WindowKey::decode(&String::from_utf8_lossy(&key)) else {
                continue;
            };
            if window.window_end() <= cutoff {
                self.db
                    .delete_cf(&cf, &key)
                    .map_err(|e| StoreError::Database(e.to_string()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn monthly_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
    ) -> Result<Option<MonthlyUsage>> {
        let cf = self.cf(cf::MONTHLY_USAGE)?;
        let value = self
            .db
            .get_cf(&cf, usage_key(user_id, month))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(value.map(|v| {
            let [content, sentiment, keywords, summaries, api] = decode_lanes(&v);
            MonthlyUsage {
                user_id: *user_id,
                month,
                content_generated: content,
                sentiment_used: sentiment,
                keywords_used: keywords,
                summaries_used: summaries,
                api_calls: api,
            }
        }))
    }

    async fn record_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
        feature: Feature,
        delta: u64,
    ) -> Result<MonthlyUsage> {
        let cf = self.cf(cf::MONTHLY_USAGE)?;
        let key = usage_key(user_id, month);

        let mut cell = [0u64; USAGE_LANES];
        cell[usage_lane(feature)] = delta;
        let mut value = Vec::with_capacity(USAGE_LANES * 8);
        for lane in cell {
            value.extend_from_slice(&lane.to_le_bytes());
        }

        self.db
            .merge_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        self.monthly_usage(user_id, month).await?.ok_or_else(|| {
            StoreError::Database("merged monthly usage row missing".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metergate_core::{LimitClass, Subject};
    use tempfile::TempDir;

    fn open_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let store = RocksStore::open(dir.path()).expect("open rocksdb");
        (store, dir)
    }

    #[tokio::test]
    async fn merge_increments_counter() {
        let (store, _dir) = open_store();
        let key = WindowKey::for_instant(
            Subject::user(UserId::generate()),
            LimitClass::Minute,
            Utc::now(),
        );

        assert_eq!(store.fetch_window(&key).await.unwrap(), None);
        assert_eq!(store.increment_window(&key).await.unwrap(), 1);
        assert_eq!(store.increment_window(&key).await.unwrap(), 2);
        assert_eq!(store.increment_window(&key).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn purge_drops_expired_windows() {
        let (store, _dir) = open_store();
        let subject = Subject::user(UserId::generate());
        let old = WindowKey::for_instant(
            subject,
            LimitClass::Minute,
            Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
        );
        let live = WindowKey::for_instant(
            subject,
            LimitClass::Minute,
            Utc.with_ymd_and_hms(2026, 8, 7, 13, 0, 0).unwrap(),
        );
        store.increment_window(&old).await.unwrap();
        store.increment_window(&live).await.unwrap();

        let cutoff = Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 0).unwrap();
        assert_eq!(store.purge_expired_windows(cutoff).await.unwrap(), 1);
        assert_eq!(store.fetch_window(&old).await.unwrap(), None);
        assert_eq!(store.fetch_window(&live).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn usage_lanes_accumulate_independently() {
        let (store, _dir) = open_store();
        let user = UserId::generate();
        let month = BillingMonth::current();

        store
            .record_usage(&user, month, Feature::ContentGeneration, 2)
            .await
            .unwrap();
        let row = store
            .record_usage(&user, month, Feature::Summarization, 1)
            .await
            .unwrap();

        assert_eq!(row.content_generated, 2);
        assert_eq!(row.summaries_used, 1);
        assert_eq!(row.api_calls, 0);
    }

    #[tokio::test]
    async fn usage_survives_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let user = UserId::generate();
        let month = BillingMonth::current();

        {
            let store = RocksStore::open(dir.path()).expect("open rocksdb");
            store
                .record_usage(&user, month, Feature::ApiCall, 7)
                .await
                .unwrap();
        }

        let store = RocksStore::open(dir.path()).expect("reopen rocksdb");
        let row = store.monthly_usage(&user, month).await.unwrap().unwrap();
        assert_eq!(row.api_calls, 7);
    }
}
