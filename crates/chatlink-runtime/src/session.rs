//! Explicit client context and signed-in session
//!
//! There is no process-wide "current user". A [`Session`] is only produced by
//! the auth manager for a verified account and is handed to every manager that
//! acts on that user's behalf.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use chatlink_core::{
    AuthProvider, AuthUser, ChatlinkConfig, DocumentStore, MediaUploader, TimeSource, Timestamp,
    UserId,
};

// ----------------------------------------------------------------------------
// Client Context
// ----------------------------------------------------------------------------

/// Handles to the backend collaborators plus configuration
#[derive(Clone)]
pub struct ClientContext {
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub media: Arc<dyn MediaUploader>,
    pub config: ChatlinkConfig,
    pub time_source: Arc<dyn TimeSource>,
}

impl ClientContext {
    /// Current time from the configured clock
    pub fn now(&self) -> Timestamp {
        self.time_source.now()
    }
}

impl core::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// A signed-in, verified user together with the client context
#[derive(Debug, Clone)]
pub struct Session {
    user: AuthUser,
    context: ClientContext,
}

impl Session {
    pub(crate) fn new(user: AuthUser, context: ClientContext) -> Self {
        Self { user, context }
    }

    /// Id of the signed-in user
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Account data as last reported by the auth provider
    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.context.store
    }

    pub fn config(&self) -> &ChatlinkConfig {
        &self.context.config
    }
}

// ----------------------------------------------------------------------------
// Pending Verification
// ----------------------------------------------------------------------------

/// An account created by sign-up that has not been verified yet
///
/// The verification window starts when this value is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub user: AuthUser,
    pub started_at: Timestamp,
}

impl PendingVerification {
    /// Whether the verification window has elapsed at `now`
    pub fn is_expired(&self, now: Timestamp, window_secs: u64) -> bool {
        now > self.started_at.add_seconds(window_secs)
    }

    /// Whole seconds left in the window at `now`
    pub fn remaining_secs(&self, now: Timestamp, window_secs: u64) -> u64 {
        self.started_at
            .add_seconds(window_secs)
            .duration_since(now)
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_verification_window() {
        let pending = PendingVerification {
            user: AuthUser {
                id: UserId::new("u1").unwrap(),
                email: "u1@example.com".into(),
                display_name: None,
                email_verified: false,
                created_at: Timestamp::new(0),
            },
            started_at: Timestamp::new(10_000),
        };

        assert!(!pending.is_expired(Timestamp::new(10_000), 300));
        assert!(!pending.is_expired(Timestamp::new(310_000), 300));
        assert!(pending.is_expired(Timestamp::new(310_001), 300));
        assert_eq!(pending.remaining_secs(Timestamp::new(70_000), 300), 240);
        assert_eq!(pending.remaining_secs(Timestamp::new(900_000), 300), 0);
    }
}
