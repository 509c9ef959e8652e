//! Rate-limit classes and per-plan limit configuration.
//!
//! Short-horizon throttling is independent from monthly quota: limit values
//! are a function of `(limit_class, plan)` and live in their own table, not
//! in the plan catalog. The table is immutable configuration, loaded once
//! and passed by reference into the rate limiter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============================================================================
// Default per-plan request rates
// ============================================================================

/// Default rate for the free plan.
pub const FREE_RATE: PlanRate = PlanRate {
    per_minute: 10,
    per_hour: 100,
};

/// Default rate for the basic plan.
pub const BASIC_RATE: PlanRate = PlanRate {
    per_minute: 30,
    per_hour: 500,
};

/// Default rate for the professional plan.
pub const PROFESSIONAL_RATE: PlanRate = PlanRate {
    per_minute: 100,
    per_hour: 2_000,
};

/// Default rate for the enterprise plan.
pub const ENTERPRISE_RATE: PlanRate = PlanRate {
    per_minute: 300,
    per_hour: 10_000,
};

/// A fixed-window limit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitClass {
    /// 60-second windows.
    Minute,

    /// 3600-second windows.
    Hour,
}

impl LimitClass {
    /// Both classes, checked in order (cheapest horizon first).
    pub const ALL: [Self; 2] = [Self::Minute, Self::Hour];

    /// The fixed window size in seconds.
    #[must_use]
    pub const fn window_secs(self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
        }
    }

    /// Get the class name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
        }
    }
}

impl std::fmt::Display for LimitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum requests per window for one plan, per limit class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRate {
    /// Maximum requests per 60-second window.
    pub per_minute: u64,

    /// Maximum requests per 3600-second window.
    pub per_hour: u64,
}

impl PlanRate {
    /// The limit for a class.
    #[must_use]
    pub const fn limit_for(&self, class: LimitClass) -> u64 {
        match class {
            LimitClass::Minute => self.per_minute,
            LimitClass::Hour => self.per_hour,
        }
    }
}

/// Immutable `(plan, limit_class)` → max-requests table.
///
/// Unknown plan identifiers fall back to the free plan's rate, mirroring the
/// plan catalog's fallback behavior.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    rates: HashMap<String, PlanRate>,
    fallback: PlanRate,
}

impl RateLimitSettings {
    /// Build settings with an explicit fallback rate.
    #[must_use]
    pub fn new(fallback: PlanRate) -> Self {
        Self {
            rates: HashMap::new(),
            fallback,
        }
    }

    /// Add or replace the rate for a plan.
    #[must_use]
    pub fn with_rate(mut self, plan_id: impl Into<String>, rate: PlanRate) -> Self {
        self.rates.insert(plan_id.into(), rate);
        self
    }

    /// The request limit for `(plan, class)`.
    #[must_use]
    pub fn limit_for(&self, plan_id: &str, class: LimitClass) -> u64 {
        self.rates
            .get(plan_id)
            .unwrap_or(&self.fallback)
            .limit_for(class)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self::new(FREE_RATE)
            .with_rate("free", FREE_RATE)
            .with_rate("basic", BASIC_RATE)
            .with_rate("professional", PROFESSIONAL_RATE)
            .with_rate("enterprise", ENTERPRISE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_sizes() {
        assert_eq!(LimitClass::Minute.window_secs(), 60);
        assert_eq!(LimitClass::Hour.window_secs(), 3600);
    }

    #[test]
    fn default_table_professional_minute() {
        let settings = RateLimitSettings::default();
        assert_eq!(settings.limit_for("professional", LimitClass::Minute), 100);
        assert_eq!(settings.limit_for("professional", LimitClass::Hour), 2_000);
    }

    #[test]
    fn unknown_plan_falls_back_to_free_rate() {
        let settings = RateLimitSettings::default();
        assert_eq!(
            settings.limit_for("mystery", LimitClass::Minute),
            FREE_RATE.per_minute
        );
    }

    #[test]
    fn with_rate_overrides() {
        let settings = RateLimitSettings::default().with_rate(
            "basic",
            PlanRate {
                per_minute: 5,
                per_hour: 50,
            },
        );
        assert_eq!(settings.limit_for("basic", LimitClass::Minute), 5);
        assert_eq!(settings.limit_for("basic", LimitClass::Hour), 50);
    }
}
