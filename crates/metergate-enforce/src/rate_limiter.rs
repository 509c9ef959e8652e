//! Fixed-window rate limiting.
//!
//! Every request is evaluated against the minute window and the hour window
//! for its subject. All window counts are read first; a violation of either
//! denies the request and increments **neither** counter — a denied attempt
//! must not itself consume budget, so `remaining` stays accurate for
//! well-behaved retries and a sustained-overload client cannot pin the
//! counter at the limit forever. Only when every window passes are the
//! counters incremented.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use metergate_core::{LimitClass, RateLimitDecision, RateLimitSettings, Subject};
use metergate_store::{MeterStore, StoreError, WindowKey};

use crate::outage::OutageLog;

/// Fixed-window rate limiter over the shared counter store.
pub struct RateLimiter {
    store: Arc<dyn MeterStore>,
    settings: RateLimitSettings,
    outages: OutageLog,
}

impl RateLimiter {
    /// Create a limiter with the given limit table.
    #[must_use]
    pub fn new(store: Arc<dyn MeterStore>, settings: RateLimitSettings) -> Self {
        Self {
            store,
            settings,
            outages: OutageLog::new(),
        }
    }

    /// Check and consume one request for `subject` under `plan_id`, now.
    pub async fn check_and_consume(&self, subject: Subject, plan_id: &str) -> RateLimitDecision {
        self.check_and_consume_at(subject, plan_id, Utc::now())
            .await
    }

    /// Check and consume one request at an explicit instant.
    ///
    /// Returns the violated window on deny; on allow, the window with the
    /// least remaining budget (the one a client should pace against).
    pub async fn check_and_consume_at(
        &self,
        subject: Subject,
        plan_id: &str,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        // Phase 1: read every window before touching any counter.
        let mut windows = Vec::with_capacity(LimitClass::ALL.len());
        for class in LimitClass::ALL {
            let limit = self.settings.limit_for(plan_id, class);
            let key = WindowKey::for_instant(subject, class, now);

            let count = match self.store.fetch_window(&key).await {
                Ok(count) => {
                    self.note_success();
                    count.unwrap_or(0)
                }
                Err(err) => return self.fail_open(&key, limit, &err),
            };

            if count >= limit {
                return RateLimitDecision {
                    allowed: false,
                    class,
                    limit,
                    remaining: 0,
                    reset_at: key.reset_at(),
                };
            }
            windows.push((key, limit));
        }

        // Phase 2: all windows have room; consume from each.
        let mut binding: Option<RateLimitDecision> = None;
        for (key, limit) in windows {
            let new_count = match self.store.increment_window(&key).await {
                Ok(count) => {
                    self.note_success();
                    count
                }
                Err(err) => return self.fail_open(&key, limit, &err),
            };

            let decision = RateLimitDecision {
                allowed: true,
                class: key.class,
                limit,
                remaining: limit.saturating_sub(new_count),
                reset_at: key.reset_at(),
            };
            let tighter = binding.map_or(true, |b| decision.remaining < b.remaining);
            if tighter {
                binding = Some(decision);
            }
        }

        binding.unwrap_or_else(|| {
            // Unreachable with a non-empty LimitClass::ALL; keep a sane
            // permissive decision rather than panicking in the hot path.
            let key = WindowKey::for_instant(subject, LimitClass::Minute, now);
            RateLimitDecision {
                allowed: true,
                class: LimitClass::Minute,
                limit: 0,
                remaining: 0,
                reset_at: key.reset_at(),
            }
        })
    }

    /// A throttling outage must never block the product: return a
    /// permissive best-effort decision and warn once per distinct failure.
    fn fail_open(&self, key: &WindowKey, limit: u64, err: &StoreError) -> RateLimitDecision {
        if self.outages.note_failure(&err.to_string()) {
            tracing::warn!(
                class = %key.class,
                error = %err,
                "rate limiter store unreachable, failing open"
            );
        }
        RateLimitDecision {
            allowed: true,
            class: key.class,
            limit,
            remaining: limit,
            reset_at: key.reset_at(),
        }
    }

    fn note_success(&self) {
        if self.outages.note_success() {
            tracing::info!("rate limiter store recovered");
        }
    }
}
