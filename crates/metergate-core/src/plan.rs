//! Subscription plans and the plan catalog.
//!
//! Plans are immutable reference data: loaded once at process start (or
//! refreshed from a [`PlanSource`]), then shared by reference. The catalog
//! lookup is total — an unknown plan identifier resolves to the `free`
//! plan's limits, never to an error that blocks a request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::feature::Feature;

// ============================================================================
// Constants
// ============================================================================

/// Sentinel limit meaning "no monthly cap".
pub const UNLIMITED: i64 = -1;

/// Identifier of the free plan (the catalog fallback).
pub const FREE_PLAN_ID: &str = "free";

/// Basic plan monthly price in cents ($9.99).
pub const BASIC_PLAN_PRICE_CENTS: i64 = 999;

/// Professional plan monthly price in cents ($29.99).
pub const PROFESSIONAL_PLAN_PRICE_CENTS: i64 = 2999;

/// Enterprise plan monthly price in cents ($99.99).
pub const ENTERPRISE_PLAN_PRICE_CENTS: i64 = 9999;

/// Free plan monthly content-generation cap.
pub const FREE_MONTHLY_CONTENT_LIMIT: i64 = 5;

/// Basic plan monthly content-generation cap.
pub const BASIC_MONTHLY_CONTENT_LIMIT: i64 = 50;

/// Professional plan monthly content-generation cap.
pub const PROFESSIONAL_MONTHLY_CONTENT_LIMIT: i64 = 500;

/// A subscription plan: price, feature flags, and monthly quotas.
///
/// `max_content_length` bounds a single generation request; the per-feature
/// monthly caps live in [`PlanLimits`]. Both use [`UNLIMITED`] for "no cap".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan identifier (e.g. `free`, `basic`, `professional`, `enterprise`).
    pub id: String,

    /// Monthly price in cents.
    pub monthly_price_cents: i64,

    /// Maximum length of a single generated content item, in characters.
    pub max_content_length: i64,

    /// Per-capability enable flags.
    pub flags: PlanFlags,

    /// Per-feature monthly quotas.
    pub limits: PlanLimits,
}

impl Plan {
    /// Whether this plan enables `feature` at all.
    ///
    /// Content generation is available on every plan; the other capabilities
    /// are gated by the plan's flags. A disabled feature is a distinct denial
    /// from an exhausted quota.
    #[must_use]
    pub const fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::ContentGeneration => true,
            Feature::SentimentAnalysis => self.flags.sentiment_analysis,
            Feature::KeywordExtraction => self.flags.keyword_extraction,
            Feature::Summarization => self.flags.summarization,
            Feature::ApiCall => self.flags.api_access,
        }
    }

    /// The monthly quota for `feature` ([`UNLIMITED`] = no cap).
    #[must_use]
    pub const fn monthly_limit(&self, feature: Feature) -> i64 {
        self.limits.limit_for(feature)
    }

    /// Whether a single content item of `length` characters fits this plan.
    #[must_use]
    pub fn allows_content_length(&self, length: usize) -> bool {
        self.max_content_length == UNLIMITED
            || i64::try_from(length).is_ok_and(|len| len <= self.max_content_length)
    }
}

/// Per-capability enable flags for a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFlags {
    /// Sentiment analysis enabled.
    pub sentiment_analysis: bool,

    /// Keyword extraction enabled.
    pub keyword_extraction: bool,

    /// Summarization enabled.
    pub summarization: bool,

    /// Programmatic API access enabled.
    pub api_access: bool,
}

/// Per-feature monthly quotas for a plan ([`UNLIMITED`] = no cap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Content generations per month.
    pub content_generation: i64,

    /// Sentiment analyses per month.
    pub sentiment_analysis: i64,

    /// Keyword extractions per month.
    pub keyword_extraction: i64,

    /// Summarizations per month.
    pub summarization: i64,

    /// API calls per month.
    pub api_calls: i64,
}

impl PlanLimits {
    /// The monthly quota for `feature`.
    #[must_use]
    pub const fn limit_for(&self, feature: Feature) -> i64 {
        match feature {
            Feature::ContentGeneration => self.content_generation,
            Feature::SentimentAnalysis => self.sentiment_analysis,
            Feature::KeywordExtraction => self.keyword_extraction,
            Feature::Summarization => self.summarization,
            Feature::ApiCall => self.api_calls,
        }
    }

    /// Quotas with every feature unlimited.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            content_generation: UNLIMITED,
            sentiment_analysis: UNLIMITED,
            keyword_extraction: UNLIMITED,
            summarization: UNLIMITED,
            api_calls: UNLIMITED,
        }
    }
}

/// The builtin free plan. Also the fallback for unknown plan identifiers.
#[must_use]
pub fn free_plan() -> Plan {
    Plan {
        id: FREE_PLAN_ID.to_string(),
        monthly_price_cents: 0,
        max_content_length: 500,
        flags: PlanFlags::default(),
        limits: PlanLimits {
            content_generation: FREE_MONTHLY_CONTENT_LIMIT,
            sentiment_analysis: 0,
            keyword_extraction: 0,
            summarization: 0,
            api_calls: 0,
        },
    }
}

/// The builtin plan table: free, basic, professional, enterprise.
#[must_use]
pub fn builtin_plans() -> Vec<Plan> {
    vec![
        free_plan(),
        Plan {
            id: "basic".to_string(),
            monthly_price_cents: BASIC_PLAN_PRICE_CENTS,
            max_content_length: 2_000,
            flags: PlanFlags {
                sentiment_analysis: true,
                keyword_extraction: true,
                summarization: false,
                api_access: false,
            },
            limits: PlanLimits {
                content_generation: BASIC_MONTHLY_CONTENT_LIMIT,
                sentiment_analysis: 100,
                keyword_extraction: 100,
                summarization: 0,
                api_calls: 0,
            },
        },
        Plan {
            id: "professional".to_string(),
            monthly_price_cents: PROFESSIONAL_PLAN_PRICE_CENTS,
            max_content_length: 5_000,
            flags: PlanFlags {
                sentiment_analysis: true,
                keyword_extraction: true,
                summarization: true,
                api_access: true,
            },
            limits: PlanLimits {
                content_generation: PROFESSIONAL_MONTHLY_CONTENT_LIMIT,
                sentiment_analysis: 1_000,
                keyword_extraction: 1_000,
                summarization: 500,
                api_calls: 10_000,
            },
        },
        Plan {
            id: "enterprise".to_string(),
            monthly_price_cents: ENTERPRISE_PLAN_PRICE_CENTS,
            max_content_length: 20_000,
            flags: PlanFlags {
                sentiment_analysis: true,
                keyword_extraction: true,
                summarization: true,
                api_access: true,
            },
            limits: PlanLimits::unlimited(),
        },
    ]
}

/// A source of plan definitions, consulted once at startup or refresh.
pub trait PlanSource {
    /// List all plans.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed.
    fn list_plans(&self) -> Result<Vec<Plan>>;
}

/// Immutable plan catalog with a total lookup.
///
/// The catalog always contains a `free` plan; [`PlanCatalog::resolve`] falls
/// back to it for unknown identifiers. Lookups take `&self` and are safe for
/// unsynchronized concurrent access once the catalog is built.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: HashMap<String, Plan>,
}

impl PlanCatalog {
    /// Build a catalog from the builtin plan table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_plans(builtin_plans())
    }

    /// Build a catalog from explicit plans.
    ///
    /// A `free` plan is inserted from the builtin table if the input lacks
    /// one, so the fallback invariant always holds.
    #[must_use]
    pub fn from_plans(plans: Vec<Plan>) -> Self {
        let mut map: HashMap<String, Plan> =
            plans.into_iter().map(|p| (p.id.clone(), p)).collect();
        map.entry(FREE_PLAN_ID.to_string()).or_insert_with(free_plan);
        Self { plans: map }
    }

    /// Build a catalog by listing plans from a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or yields no plans.
    pub fn from_source(source: &dyn PlanSource) -> Result<Self> {
        let plans = source.list_plans()?;
        if plans.is_empty() {
            return Err(CoreError::Configuration(
                "plan source returned no plans".to_string(),
            ));
        }
        Ok(Self::from_plans(plans))
    }

    /// Resolve a plan identifier to a plan. Never fails: unknown identifiers
    /// resolve to the `free` plan.
    #[must_use]
    pub fn resolve(&self, plan_id: &str) -> &Plan {
        self.plans.get(plan_id).unwrap_or_else(|| {
            self.plans
                .get(FREE_PLAN_ID)
                .expect("catalog always contains the free plan")
        })
    }

    /// Whether the catalog contains a plan with this exact identifier.
    #[must_use]
    pub fn contains(&self, plan_id: &str) -> bool {
        self.plans.contains_key(plan_id)
    }

    /// All plans, ordered by monthly price then identifier.
    #[must_use]
    pub fn plans(&self) -> Vec<&Plan> {
        let mut plans: Vec<&Plan> = self.plans.values().collect();
        plans.sort_by(|a, b| {
            a.monthly_price_cents
                .cmp(&b.monthly_price_cents)
                .then_with(|| a.id.cmp(&b.id))
        });
        plans
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
