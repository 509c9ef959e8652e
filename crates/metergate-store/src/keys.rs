//! Window key construction and encoding.
//!
//! Keys are opaque strings combining limit class, window size, window start,
//! and subject. The subject comes last because its encoding contains `:`.

use chrono::{DateTime, Utc};

use metergate_core::{LimitClass, Subject};

/// Identifies one fixed-window counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey {
    /// The principal being limited.
    pub subject: Subject,

    /// The limit class the window belongs to.
    pub class: LimitClass,

    /// Window start, unix seconds, aligned to `window_size`.
    pub window_start: i64,

    /// Window length in seconds.
    pub window_size: i64,
}

impl WindowKey {
    /// The key for the window containing `now`.
    ///
    /// `window_start = floor(now / window_size) * window_size` — fixed,
    /// non-sliding windows.
    #[must_use]
    pub fn for_instant(subject: Subject, class: LimitClass, now: DateTime<Utc>) -> Self {
        let window_size = class.window_secs();
        let window_start = now.timestamp().div_euclid(window_size) * window_size;
        Self {
            subject,
            class,
            window_start,
            window_size,
        }
    }

    /// Unix second at which the window ends and the counter resets.
    #[must_use]
    pub const fn window_end(&self) -> i64 {
        self.window_start + self.window_size
    }

    /// The window end as a timestamp, for `reset_at` in decisions.
    #[must_use]
    pub fn reset_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.window_end(), 0).unwrap_or_else(Utc::now)
    }

    /// Whether the window has ended as of `at`.
    #[must_use]
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at.timestamp() >= self.window_end()
    }

    /// Encode to the opaque string form used by persistent backends.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.class, self.window_size, self.window_start, self.subject
        )
    }

    /// Decode from the string form. Returns `None` for foreign keys.
    #[must_use]
    pub fn decode(encoded: &str) -> Option<Self> {
        let mut parts = encoded.splitn(4, ':');
        let class = match parts.next()? {
            "minute" => LimitClass::Minute,
            "hour" => LimitClass::Hour,
            _ => return None,
        };
        let window_size: i64 = parts.next()?.parse().ok()?;
        let window_start: i64 = parts.next()?.parse().ok()?;
        let subject: Subject = parts.next()?.parse().ok()?;
        Some(Self {
            subject,
            class,
            window_start,
            window_size,
        })
    }
}

/// Key for a user's monthly usage row in key-value backends.
#[must_use]
pub fn usage_key(user_id: &metergate_core::UserId, month: metergate_core::BillingMonth) -> String {
    format!("{user_id}/{month}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use metergate_core::{ApiKeyId, UserId};

    #[test]
    fn window_start_is_floor_aligned() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 34, 56).unwrap();
        let key = WindowKey::for_instant(Subject::user(UserId::generate()), LimitClass::Minute, now);
        assert_eq!(key.window_start % 60, 0);
        assert!(key.window_start <= now.timestamp());
        assert!(now.timestamp() < key.window_end());
    }

    #[test]
    fn same_window_same_key() {
        let subject = Subject::user(UserId::generate());
        let a = Utc.with_ymd_and_hms(2026, 8, 7, 12, 34, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 8, 7, 12, 34, 59).unwrap();
        assert_eq!(
            WindowKey::for_instant(subject, LimitClass::Minute, a),
            WindowKey::for_instant(subject, LimitClass::Minute, b)
        );
    }

    #[test]
    fn next_window_fresh_key() {
        let subject = Subject::user(UserId::generate());
        let a = Utc.with_ymd_and_hms(2026, 8, 7, 12, 34, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 8, 7, 12, 35, 0).unwrap();
        assert_ne!(
            WindowKey::for_instant(subject, LimitClass::Minute, a),
            WindowKey::for_instant(subject, LimitClass::Minute, b)
        );
    }

    #[test]
    fn encode_decode_roundtrip() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 30).unwrap();
        for subject in [
            Subject::user(UserId::generate()),
            Subject::api_key(ApiKeyId::generate()),
        ] {
            for class in LimitClass::ALL {
                let key = WindowKey::for_instant(subject, class, now);
                let decoded = WindowKey::decode(&key.encode()).expect("roundtrip");
                assert_eq!(key, decoded);
            }
        }
    }

    #[test]
    fn decode_rejects_foreign_keys() {
        assert!(WindowKey::decode("garbage").is_none());
        assert!(WindowKey::decode("day:86400:0:user:nope").is_none());
    }

    #[test]
    fn expiry_matches_window_end() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 34, 56).unwrap();
        let key = WindowKey::for_instant(Subject::user(UserId::generate()), LimitClass::Minute, now);
        let end = DateTime::from_timestamp(key.window_end(), 0).unwrap();
        assert!(!key.is_expired_at(now));
        assert!(key.is_expired_at(end));
    }
}
