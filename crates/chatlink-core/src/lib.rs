//! chatlink Core
//!
//! Foundational types for the chatlink client: identifiers, profiles, messages,
//! conversation keys, the friend-relationship state machine, and the traits
//! through which the client reaches its authentication provider, document store
//! and media host. In-memory implementations of each backend seam live here too,
//! so the client logic can run and be tested without a hosted service.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod auth;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod media;
pub mod memory;
pub mod profile;
pub mod relationship;
pub mod store;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use auth::{AccountRecord, AuthProvider, AuthSnapshot, AuthUser, MemoryAuthProvider};
pub use config::{AuthConfig, ChatlinkConfig, MessageConfig, StoreConfig, VerificationConfig};
pub use conversation::{conversation_key, ConversationKey, Message, MessageDraft, KEY_SEPARATOR};
pub use errors::{ChatlinkError, RelationshipError, Result, StoreError, TransportError};
pub use media::{ensure_image, MediaUploader, MemoryMediaHost};
pub use memory::{MemoryDocumentStore, StoreSnapshot};
pub use profile::{ProfileUpdate, UserProfile};
pub use relationship::{explorable, RelationshipAction, RelationshipStatus};
pub use store::{
    ConversationFeed, DocumentStore, DocumentWrite, FieldOp, ProfileQuery, RelationshipField,
    WriteBatch, MEMBERSHIP_QUERY_LIMIT,
};
pub use types::{SystemTimeSource, TimeSource, Timestamp, UserId};
