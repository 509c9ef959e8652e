//! Plan-change proration.
//!
//! A pure calculation: no I/O, no side effects, no persistence. It exists so
//! that the billing glue and the display-facing proration preview agree
//! bit-for-bit. Applying the resulting adjustment to an actual payment is
//! the caller's concern, not this module's.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::Plan;

/// Default billing cycle length in days.
pub const DEFAULT_CYCLE_DAYS: i64 = 30;

/// The outcome of prorating a mid-cycle plan change.
///
/// All amounts are integer cents, rounded half-away-from-zero. `net_cents`
/// is positive for an upgrade (additional charge), negative for a downgrade
/// (credit owed), and zero when prices are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProrationResult {
    /// Value of unused time on the old plan.
    pub credit_cents: i64,

    /// Cost of the same remaining time at the new plan's rate.
    pub charge_cents: i64,

    /// `charge - credit`.
    pub net_cents: i64,
}

impl ProrationResult {
    /// Whether the change costs the customer money.
    #[must_use]
    pub const fn is_upgrade(&self) -> bool {
        self.net_cents > 0
    }

    /// Whether the change owes the customer a credit.
    #[must_use]
    pub const fn is_downgrade(&self) -> bool {
        self.net_cents < 0
    }
}

/// Prorate a mid-cycle change from `old_plan` to `new_plan`.
///
/// `credit = daily_rate(old) * days_remaining` and
/// `charge = daily_rate(new) * days_remaining`, each rounded to whole cents
/// half-away-from-zero before the subtraction, so swapping the plans exactly
/// negates `net_cents`. `days_remaining` is clamped to `[0, cycle_days]`.
#[must_use]
pub fn calculate_proration(
    old_plan: &Plan,
    new_plan: &Plan,
    days_remaining: i64,
    cycle_days: i64,
) -> ProrationResult {
    let cycle_days = cycle_days.max(1);
    let days = days_remaining.clamp(0, cycle_days);

    let credit_cents = prorated_cents(old_plan.monthly_price_cents, days, cycle_days);
    let charge_cents = prorated_cents(new_plan.monthly_price_cents, days, cycle_days);

    ProrationResult {
        credit_cents,
        charge_cents,
        net_cents: charge_cents - credit_cents,
    }
}

/// Days left in the billing cycle, clamped to `[0, cycle_days]`.
///
/// A missing cycle end means the cycle just started: the full `cycle_days`
/// remain. Partial days count as whole days.
#[must_use]
pub fn days_remaining_in_cycle(
    cycle_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cycle_days: i64,
) -> i64 {
    let cycle_days = cycle_days.max(1);
    let Some(end) = cycle_end else {
        return cycle_days;
    };

    let seconds = (end - now).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    // seconds > 0 here, so this equals seconds.div_ceil(86_400)
    ((seconds + 86_399) / 86_400).clamp(0, cycle_days)
}

/// `price * days / cycle`, rounded half-away-from-zero to whole cents.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn prorated_cents(monthly_price_cents: i64, days: i64, cycle_days: i64) -> i64 {
    let daily = monthly_price_cents as f64 / cycle_days as f64;
    (daily * days as f64).round() as i64
}
