//! Core types and pure logic for metergate.
//!
//! This crate provides the foundational types used throughout the metergate
//! platform:
//!
//! - **Identifiers**: `UserId`, `ApiKeyId`, `Subject`
//! - **Plans**: `Plan`, `PlanCatalog`, `PlanSource`
//! - **Rate limits**: `LimitClass`, `RateLimitSettings`
//! - **Usage**: `BillingMonth`, `MonthlyUsage`, `Feature`
//! - **Proration**: `calculate_proration`, `ProrationResult`
//! - **Decisions**: `Decision`, `DenyReason`, `RateLimitDecision`, `QuotaStatus`
//!
//! # Money
//!
//! All monetary amounts are stored as `i64` integer cents to avoid floating
//! point precision issues: the `basic` plan at $9.99/month is `999` cents.
//!
//! Everything in this crate is pure: no I/O, no clocks. Operations that
//! depend on the current time take an explicit `DateTime<Utc>`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decision;
pub mod error;
pub mod feature;
pub mod ids;
pub mod limits;
pub mod plan;
pub mod proration;
pub mod usage;

pub use decision::{Decision, DenyReason, QuotaStatus, RateLimitDecision};
pub use error::{CoreError, Result};
pub use feature::Feature;
pub use ids::{ApiKeyId, IdError, Subject, UserId};
pub use limits::{LimitClass, PlanRate, RateLimitSettings};
pub use plan::{Plan, PlanCatalog, PlanFlags, PlanLimits, PlanSource, UNLIMITED};
pub use proration::{
    calculate_proration, days_remaining_in_cycle, ProrationResult, DEFAULT_CYCLE_DAYS,
};
pub use usage::{BillingMonth, MonthlyUsage};
