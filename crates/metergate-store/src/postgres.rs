//! PostgreSQL storage implementation.
//!
//! Counters use `INSERT ... ON CONFLICT ... DO UPDATE SET count = count + 1
//! RETURNING count`, which is a true atomic increment: concurrent callers
//! serialize on the row and none of them can lose an update.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use metergate_core::{BillingMonth, Feature, MonthlyUsage, UserId};

use crate::error::Result;
use crate::keys::WindowKey;
use crate::MeterStore;

/// Default statement/acquire timeout for pool connections.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum pool size.
const MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL-backed storage implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database and build a connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests that manage their own database).
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Column name for a feature counter in `monthly_usage`.
const fn usage_column(feature: Feature) -> &'static str {
    match feature {
        Feature::ContentGeneration => "content_generated",
        Feature::SentimentAnalysis => "sentiment_used",
        Feature::KeywordExtraction => "keywords_used",
        Feature::Summarization => "summaries_used",
        Feature::ApiCall => "api_calls",
    }
}

fn row_to_usage(user_id: UserId, month: BillingMonth, row: &sqlx::postgres::PgRow) -> MonthlyUsage {
    let counter = |name: &str| -> u64 {
        let value: i64 = row.try_get(name).unwrap_or_default();
        u64::try_from(value).unwrap_or_default()
    };
    MonthlyUsage {
        user_id,
        month,
        content_generated: counter("content_generated"),
        sentiment_used: counter("sentiment_used"),
        keywords_used: counter("keywords_used"),
        summaries_used: counter("summaries_used"),
        api_calls: counter("api_calls"),
    }
}

#[async_trait]
impl MeterStore for PgStore {
    async fn fetch_window(&self, key: &WindowKey) -> Result<Option<u64>> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT count FROM window_counters WHERE key = $1")
                .bind(key.encode())
                .fetch_optional(&self.pool)
                .await?;
        Ok(count.map(|c| u64::try_from(c).unwrap_or_default()))
    }

    async fn increment_window(&self, key: &WindowKey) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "INSERT INTO window_counters (key, window_end, count)
             VALUES ($1, $2, 1)
             ON CONFLICT (key)
             DO UPDATE SET count = window_counters.count + 1
             RETURNING count",
        )
        .bind(key.encode())
        .bind(key.window_end())
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn purge_expired_windows(&self, before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM window_counters WHERE window_end <= $1")
            .bind(before.timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn monthly_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
    ) -> Result<Option<MonthlyUsage>> {
        let row = sqlx::query(
            "SELECT content_generated, sentiment_used, keywords_used, summaries_used, api_calls
             FROM monthly_usage
             WHERE user_id = $1 AND month = $2",
        )
        .bind(*user_id.as_uuid())
        .bind(month.first_day())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| row_to_usage(*user_id, month, &row)))
    }

    async fn record_usage(
        &self,
        user_id: &UserId,
        month: BillingMonth,
        feature: Feature,
        delta: u64,
    ) -> Result<MonthlyUsage> {
        // The column name comes from a fixed table, never from input.
        let column = usage_column(feature);
        let sql = format!(
            "INSERT INTO monthly_usage (user_id, month, {column})
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, month)
             DO UPDATE SET {column} = monthly_usage.{column} + EXCLUDED.{column}
             RETURNING content_generated, sentiment_used, keywords_used, summaries_used, api_calls"
        );
        let row = sqlx::query(&sql)
            .bind(*user_id.as_uuid())
            .bind(month.first_day())
            .bind(i64::try_from(delta).unwrap_or(i64::MAX))
            .fetch_one(&self.pool)
            .await?;
        Ok(row_to_usage(*user_id, month, &row))
    }
}
