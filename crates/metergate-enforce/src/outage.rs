//! Outage-aware warning dedup.
//!
//! A backing-store outage during a traffic spike would otherwise emit one
//! warning per denied-or-allowed request. This throttles to one log line per
//! distinct failure, and re-arms once the store answers again so the next
//! outage is visible.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Tracks which failure signatures have already been logged.
#[derive(Debug, Default)]
pub struct OutageLog {
    seen: Mutex<HashSet<String>>,
}

impl OutageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Returns `true` exactly once per distinct signature
    /// until [`OutageLog::note_success`] re-arms the log; the caller emits
    /// the actual warning when this returns `true`.
    pub fn note_failure(&self, signature: &str) -> bool {
        lock(&self.seen).insert(signature.to_string())
    }

    /// Record a successful store call. Clears the failure set so a later
    /// outage logs again. Returns `true` if an outage had been active.
    pub fn note_success(&self) -> bool {
        let mut seen = lock(&self.seen);
        let was_failing = !seen.is_empty();
        seen.clear();
        was_failing
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
