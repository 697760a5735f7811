//! Session-scoped managers for the chatlink runtime
//!
//! Each manager owns a [`Session`](crate::Session) and acts for that user.

pub mod auth;
pub mod chat;
pub mod profile;
pub mod relationships;

pub use auth::{AuthManager, SignUpForm};
pub use chat::{ChatManager, ConversationSubscription};
pub use profile::ProfileManager;
pub use relationships::{search, RelationshipSynchronizer};
