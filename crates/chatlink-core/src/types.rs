//! Core types for the chatlink client
//!
//! Newtype wrappers that carry validation with them, so an identifier that made
//! it into a profile or a conversation key is known to be well formed.

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::conversation::KEY_SEPARATOR;
use crate::errors::ChatlinkError;

// ----------------------------------------------------------------------------
// User Identifier
// ----------------------------------------------------------------------------

/// Stable identifier of a user, assigned by the auth provider at account creation
///
/// Only ASCII alphanumerics and `-` are accepted. In particular the conversation
/// key separator can never appear inside an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Longest id accepted
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap an identifier
    pub fn new(id: impl Into<String>) -> Result<Self, ChatlinkError> {
        let id = id.into();

        if id.is_empty() {
            return Err(ChatlinkError::validation("user_id", "must not be empty"));
        }
        if id.len() > Self::MAX_LEN {
            return Err(ChatlinkError::validation(
                "user_id",
                format!("must be at most {} characters", Self::MAX_LEN),
            ));
        }
        if let Some(bad) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        {
            let reason = if bad == KEY_SEPARATOR {
                format!("'{}' is reserved as the conversation key separator", KEY_SEPARATOR)
            } else {
                format!("invalid character {:?}", bad)
            };
            return Err(ChatlinkError::validation("user_id", reason));
        }

        Ok(Self(id))
    }

    /// Wrap a value that was already validated as a `UserId`
    pub(crate) fn from_validated(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = ChatlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for UserId {
    type Error = ChatlinkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl Deref for UserId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Millisecond timestamp since Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a new timestamp
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Get current wall-clock timestamp
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self(duration.as_millis() as u64)
    }

    /// Get the raw milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Add seconds to this timestamp
    pub fn add_seconds(&self, seconds: u64) -> Self {
        Self(self.0.saturating_add(seconds.saturating_mul(1000)))
    }

    /// Get duration since another timestamp (zero if `other` is later)
    pub fn duration_since(&self, other: Self) -> core::time::Duration {
        core::time::Duration::from_millis(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Time Source Trait
// ----------------------------------------------------------------------------

/// Source of timestamps
///
/// Stores and the verification window read time through this trait so tests can
/// pin the clock.
pub trait TimeSource: Send + Sync {
    /// Get the current timestamp
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation of TimeSource
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validation() {
        assert!(UserId::new("u1").is_ok());
        assert!(UserId::new("Xk3-9aQ").is_ok());

        assert!(UserId::new("").is_err());
        assert!(UserId::new("u1_u2").is_err());
        assert!(UserId::new("has space").is_err());
        assert!(UserId::new("a".repeat(UserId::MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_user_id_serde_rejects_separator() {
        let ok: UserId = serde_json::from_str("\"u7\"").unwrap();
        assert_eq!(ok.as_str(), "u7");

        let bad: Result<UserId, _> = serde_json::from_str("\"u7_u8\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let start = Timestamp::new(1_000);
        let later = start.add_seconds(5);
        assert_eq!(later.as_millis(), 6_000);
        assert_eq!(later.duration_since(start).as_secs(), 5);
        assert_eq!(start.duration_since(later).as_millis(), 0);
    }
}
