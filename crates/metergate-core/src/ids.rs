//! Identifier types for metergate.
//!
//! This module provides strongly-typed identifiers for users and API keys,
//! plus the `Subject` type that rate limits and quotas are tracked against.
//!
//! # Macro-based ID Types
//!
//! The `uuid_id_type!` macro reduces boilerplate for UUID-based identifier
//! types, ensuring consistent implementation of serialization, parsing, and
//! display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define a UUID-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `uuid::Uuid` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`
/// - `AsRef<[u8]>`
///
/// # Example
///
/// ```ignore
/// uuid_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::generate();
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new identifier from a UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier (primarily for testing).
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Return the bytes of the UUID (16 bytes).
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }
    };
}

// Define UUID-based identifier types using the macro
uuid_id_type!(UserId, "A user identifier (UUID format).\n\nUser IDs are owned by the account system and arrive as opaque UUIDs.");
uuid_id_type!(ApiKeyId, "An API key identifier (UUID format).\n\nIdentifies a programmatic-access key; limits for key-authenticated calls\nare tracked against the key, not the owning user.");

/// A rate-limit / quota principal: either a user or an API key.
///
/// Limits are evaluated per subject. A subject has exactly one active plan
/// at a time (the plan of its owning account).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subject {
    /// An end user, identified by their account UUID.
    User(UserId),

    /// An API key used for programmatic access.
    ApiKey(ApiKeyId),
}

impl Subject {
    /// Prefix used in the string encoding of user subjects.
    const USER_PREFIX: &'static str = "user";

    /// Prefix used in the string encoding of API-key subjects.
    const API_KEY_PREFIX: &'static str = "api-key";

    /// Create a subject for a user.
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self::User(id)
    }

    /// Create a subject for an API key.
    #[must_use]
    pub const fn api_key(id: ApiKeyId) -> Self {
        Self::ApiKey(id)
    }

    /// The user ID, if this subject is a user.
    #[must_use]
    pub const fn as_user(&self) -> Option<&UserId> {
        match self {
            Self::User(id) => Some(id),
            Self::ApiKey(_) => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{}:{id}", Self::USER_PREFIX),
            Self::ApiKey(id) => write!(f, "{}:{id}", Self::API_KEY_PREFIX),
        }
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subject({self})")
    }
}

impl FromStr for Subject {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, id) = s.split_once(':').ok_or(IdError::InvalidSubject)?;
        match prefix {
            Self::USER_PREFIX => Ok(Self::User(id.parse()?)),
            Self::API_KEY_PREFIX => Ok(Self::ApiKey(id.parse()?)),
            _ => Err(IdError::InvalidSubject),
        }
    }
}

impl TryFrom<String> for Subject {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.to_string()
    }
}

impl From<UserId> for Subject {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<ApiKeyId> for Subject {
    fn from(id: ApiKeyId) -> Self {
        Self::ApiKey(id)
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid subject (`user:<uuid>` or `api-key:<uuid>`).
    #[error("invalid subject format")]
    InvalidSubject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::generate();
        let str_repr = id.to_string();
        let parsed = UserId::from_str(&str_repr).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn user_id_serde_json() {
        let id = UserId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn api_key_id_roundtrip() {
        let id = ApiKeyId::generate();
        let str_repr = id.to_string();
        let parsed = ApiKeyId::from_str(&str_repr).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn subject_user_roundtrip() {
        let subject = Subject::user(UserId::generate());
        let str_repr = subject.to_string();
        assert!(str_repr.starts_with("user:"));
        let parsed: Subject = str_repr.parse().unwrap();
        assert_eq!(subject, parsed);
    }

    #[test]
    fn subject_api_key_roundtrip() {
        let subject = Subject::api_key(ApiKeyId::generate());
        let str_repr = subject.to_string();
        assert!(str_repr.starts_with("api-key:"));
        let parsed: Subject = str_repr.parse().unwrap();
        assert_eq!(subject, parsed);
    }

    #[test]
    fn subject_serde_json() {
        let subject = Subject::user(UserId::generate());
        let json = serde_json::to_string(&subject).unwrap();
        let parsed: Subject = serde_json::from_str(&json).unwrap();
        assert_eq!(subject, parsed);
    }

    #[test]
    fn subject_rejects_garbage() {
        assert!("nonsense".parse::<Subject>().is_err());
        assert!("user".parse::<Subject>().is_err());
        assert!("team:00000000-0000-0000-0000-000000000000"
            .parse::<Subject>()
            .is_err());
        assert!("user:not-a-uuid".parse::<Subject>().is_err());
    }

    #[test]
    fn subject_as_user() {
        let user_id = UserId::generate();
        assert_eq!(Subject::user(user_id).as_user(), Some(&user_id));
        assert!(Subject::api_key(ApiKeyId::generate()).as_user().is_none());
    }
}
