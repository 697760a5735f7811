//! Centralized Configuration Management
//!
//! All tunables of the client core in one serde-friendly tree, so the CLI can
//! load them from TOML and tests can pick a preset.

use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{ChatlinkError, Result};

// ----------------------------------------------------------------------------
// Message Configuration
// ----------------------------------------------------------------------------

/// Limits applied to outgoing chat messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Maximum message length in characters
    pub max_length: usize,
    /// Maximum number of messages returned by a history read
    pub history_limit: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            max_length: 2000,
            history_limit: 500,
        }
    }
}

impl MessageConfig {
    /// Small limits for tests
    pub fn testing() -> Self {
        Self {
            max_length: 64,
            history_limit: 50,
        }
    }
}

// ----------------------------------------------------------------------------
// Store Configuration
// ----------------------------------------------------------------------------

/// Document store behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Buffer size for each conversation's subscription channel
    pub subscription_buffer_size: usize,
    /// Maximum number of ids in one membership query
    pub membership_query_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            subscription_buffer_size: 64,
            membership_query_limit: crate::store::MEMBERSHIP_QUERY_LIMIT,
        }
    }
}

impl StoreConfig {
    /// Tiny buffers so lagging subscribers show up in tests
    pub fn testing() -> Self {
        Self {
            subscription_buffer_size: 8,
            membership_query_limit: crate::store::MEMBERSHIP_QUERY_LIMIT,
        }
    }
}

// ----------------------------------------------------------------------------
// Auth Configuration
// ----------------------------------------------------------------------------

/// Account rules enforced by the in-memory auth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Minimum password length
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
        }
    }
}

// ----------------------------------------------------------------------------
// Verification Configuration
// ----------------------------------------------------------------------------

/// Email verification window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Seconds after sign-up during which verification may be checked
    pub window_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { window_secs: 300 }
    }
}

impl VerificationConfig {
    /// Window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

// ----------------------------------------------------------------------------
// Root Configuration
// ----------------------------------------------------------------------------

/// Complete chatlink core configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatlinkConfig {
    #[serde(default)]
    pub messages: MessageConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
}

impl ChatlinkConfig {
    /// Preset used throughout the test suites
    pub fn testing() -> Self {
        Self {
            messages: MessageConfig::testing(),
            store: StoreConfig::testing(),
            auth: AuthConfig::default(),
            verification: VerificationConfig::default(),
        }
    }

    /// Reject configurations that would make the client unusable
    pub fn validate(&self) -> Result<()> {
        if self.messages.max_length == 0 {
            return Err(ChatlinkError::config_error(
                "messages.max_length must be greater than 0",
            ));
        }
        if self.messages.history_limit == 0 {
            return Err(ChatlinkError::config_error(
                "messages.history_limit must be greater than 0",
            ));
        }
        if self.store.subscription_buffer_size == 0 {
            return Err(ChatlinkError::config_error(
                "store.subscription_buffer_size must be greater than 0",
            ));
        }
        if self.store.membership_query_limit == 0 {
            return Err(ChatlinkError::config_error(
                "store.membership_query_limit must be greater than 0",
            ));
        }
        if self.verification.window_secs == 0 {
            return Err(ChatlinkError::config_error(
                "verification.window_secs must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChatlinkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.messages.max_length, 2000);
        assert_eq!(config.auth.min_password_length, 6);
        assert_eq!(config.verification.window(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_validation() {
        let mut config = ChatlinkConfig::testing();
        assert!(config.validate().is_ok());

        config.store.subscription_buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ChatlinkConfig =
            serde_json::from_str(r#"{"messages":{"max_length":10,"history_limit":5}}"#).unwrap();
        assert_eq!(config.messages.max_length, 10);
        assert_eq!(config.store, StoreConfig::default());
    }
}
