//! Monthly usage rows.
//!
//! One row per user per calendar month; created on first metered use in a
//! month; counters are incremented per feature and never decremented. The
//! core never deletes rows — retention is a collaborator concern.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::feature::Feature;
use crate::ids::UserId;

/// A calendar month, normalized to its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingMonth {
    year: i32,
    month: u32,
}

impl BillingMonth {
    /// The month containing `at`.
    #[must_use]
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    /// The current month.
    #[must_use]
    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    /// The year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// The month number (1–12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// The first day of the month.
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("month is validated at construction")
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid billing month: {s}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid billing month year: {s}"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid billing month: {s}"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("invalid billing month: {s}"));
        }
        Ok(Self { year, month })
    }
}

impl TryFrom<String> for BillingMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillingMonth> for String {
    fn from(month: BillingMonth) -> Self {
        month.to_string()
    }
}

impl From<NaiveDate> for BillingMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Per-user, per-month usage counters — one per metered feature.
///
/// Counts are monotonically non-decreasing within a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyUsage {
    /// The user the counters belong to.
    pub user_id: UserId,

    /// The calendar month.
    pub month: BillingMonth,

    /// Content items generated.
    pub content_generated: u64,

    /// Sentiment analyses performed.
    pub sentiment_used: u64,

    /// Keyword extractions performed.
    pub keywords_used: u64,

    /// Summaries produced.
    pub summaries_used: u64,

    /// API calls made.
    pub api_calls: u64,
}

impl MonthlyUsage {
    /// A fresh row with all counters zero.
    #[must_use]
    pub const fn empty(user_id: UserId, month: BillingMonth) -> Self {
        Self {
            user_id,
            month,
            content_generated: 0,
            sentiment_used: 0,
            keywords_used: 0,
            summaries_used: 0,
            api_calls: 0,
        }
    }

    /// The counter for `feature`.
    #[must_use]
    pub const fn used(&self, feature: Feature) -> u64 {
        match feature {
            Feature::ContentGeneration => self.content_generated,
            Feature::SentimentAnalysis => self.sentiment_used,
            Feature::KeywordExtraction => self.keywords_used,
            Feature::Summarization => self.summaries_used,
            Feature::ApiCall => self.api_calls,
        }
    }

    /// Increment the counter for `feature` by `delta`.
    pub fn apply(&mut self, feature: Feature, delta: u64) {
        let counter = match feature {
            Feature::ContentGeneration => &mut self.content_generated,
            Feature::SentimentAnalysis => &mut self.sentiment_used,
            Feature::KeywordExtraction => &mut self.keywords_used,
            Feature::Summarization => &mut self.summaries_used,
            Feature::ApiCall => &mut self.api_calls,
        };
        *counter = counter.saturating_add(delta);
    }
}
