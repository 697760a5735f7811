//! chatlink Runtime
//!
//! This crate contains the client side of chatlink:
//! - `ClientBuilder` / `ChatClient`: wiring of the backend collaborators
//! - `Session`: the explicit signed-in user context
//! - `RelationshipSynchronizer`: friend requests and friendships
//! - Auth, chat and profile managers
//! - `Notice`: user-facing error reporting
//!
//! `chatlink-core` provides the data model and the backend seams; this crate
//! drives them on behalf of a user.

pub mod builder;
pub mod managers;
pub mod notices;
pub mod session;

pub use builder::{ChatClient, ClientBuilder};
pub use managers::*;
pub use notices::{Notice, NoticeLevel};
pub use session::{ClientContext, PendingVerification, Session};

// Re-export core types for convenience
pub use chatlink_core::{
    conversation_key, ChatlinkConfig, ChatlinkError, ConversationKey, Message, ProfileUpdate,
    RelationshipStatus, Result, UserId, UserProfile,
};
