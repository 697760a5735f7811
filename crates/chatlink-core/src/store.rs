//! Document store abstraction
//!
//! Profiles live in one document per user; messages live in one append-only
//! collection per conversation. Relationship changes touch two documents and
//! are therefore expressed as a [`WriteBatch`] of set-union/set-remove
//! operations that the store commits all-or-nothing.

use async_trait::async_trait;
use core::fmt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::conversation::{ConversationKey, Message, MessageDraft};
use crate::errors::Result;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::types::UserId;

/// Maximum number of ids a single membership query may name
pub const MEMBERSHIP_QUERY_LIMIT: usize = 10;

// ----------------------------------------------------------------------------
// Store Trait
// ----------------------------------------------------------------------------

/// Backend holding profile documents and conversation collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one profile document
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>>;

    /// Create a profile document; fails if one already exists
    async fn create_profile(&self, profile: UserProfile) -> Result<()>;

    /// Apply an owner update to a profile document and return the new version
    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<UserProfile>;

    /// Point a profile's avatar at an uploaded image
    async fn set_avatar(&self, id: &UserId, url: &str) -> Result<UserProfile>;

    /// Run a profile query
    async fn query_profiles(&self, query: &ProfileQuery) -> Result<Vec<UserProfile>>;

    /// Commit a multi-document batch atomically
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Append a message to its conversation, assigning time and sequence
    async fn append_message(&self, draft: MessageDraft) -> Result<Message>;

    /// The most recent `limit` messages of a conversation, oldest first
    async fn messages(&self, key: &ConversationKey, limit: usize) -> Result<Vec<Message>>;

    /// Subscribe to messages appended to a conversation from now on
    async fn subscribe_conversation(&self, key: &ConversationKey) -> Result<ConversationFeed>;

    /// Number of live subscriptions on a conversation
    fn listener_count(&self, key: &ConversationKey) -> usize;
}

// ----------------------------------------------------------------------------
// Profile Queries
// ----------------------------------------------------------------------------

/// Profile selections supported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileQuery {
    /// Every profile
    All,
    /// Every profile except the given one
    Excluding(UserId),
    /// Profiles whose id is in the list; at most [`MEMBERSHIP_QUERY_LIMIT`] ids
    Members(Vec<UserId>),
}

// ----------------------------------------------------------------------------
// Batch Writes
// ----------------------------------------------------------------------------

/// The three relationship sets of a profile document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipField {
    Friends,
    IncomingRequests,
    SentRequests,
}

impl RelationshipField {
    /// Field name inside the profile document
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Friends => "friends",
            Self::IncomingRequests => "incomingRequests",
            Self::SentRequests => "sentRequests",
        }
    }
}

impl fmt::Display for RelationshipField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Set operation on one relationship field
///
/// Both operations are idempotent: union of a present value and removal of an
/// absent value leave the set unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOp {
    ArrayUnion { field: RelationshipField, value: UserId },
    ArrayRemove { field: RelationshipField, value: UserId },
}

impl FieldOp {
    /// Apply the operation to a profile document
    pub fn apply(&self, profile: &mut UserProfile) {
        match self {
            FieldOp::ArrayUnion { field, value } => {
                profile.relationship_set_mut(*field).insert(value.clone());
            }
            FieldOp::ArrayRemove { field, value } => {
                profile.relationship_set_mut(*field).remove(value);
            }
        }
    }
}

/// Operations targeting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentWrite {
    pub user: UserId,
    pub ops: Vec<FieldOp>,
}

/// All-or-nothing set of document writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBatch {
    writes: Vec<DocumentWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value ∪= user.field`
    pub fn union(&mut self, user: &UserId, field: RelationshipField, value: &UserId) -> &mut Self {
        self.push(
            user,
            FieldOp::ArrayUnion {
                field,
                value: value.clone(),
            },
        )
    }

    /// Queue `user.field −= value`
    pub fn remove(&mut self, user: &UserId, field: RelationshipField, value: &UserId) -> &mut Self {
        self.push(
            user,
            FieldOp::ArrayRemove {
                field,
                value: value.clone(),
            },
        )
    }

    fn push(&mut self, user: &UserId, op: FieldOp) -> &mut Self {
        match self.writes.iter_mut().find(|w| &w.user == user) {
            Some(write) => write.ops.push(op),
            None => self.writes.push(DocumentWrite {
                user: user.clone(),
                ops: vec![op],
            }),
        }
        self
    }

    /// Documents touched by the batch, in first-touched order
    pub fn documents(&self) -> impl Iterator<Item = &UserId> {
        self.writes.iter().map(|w| &w.user)
    }

    /// Per-document writes
    pub fn writes(&self) -> &[DocumentWrite] {
        &self.writes
    }

    /// Operations queued for one document
    pub fn writes_for(&self, user: &UserId) -> Vec<&FieldOp> {
        self.writes
            .iter()
            .filter(|w| &w.user == user)
            .flat_map(|w| w.ops.iter())
            .collect()
    }

    /// Apply the operations targeting `profile` to it
    pub fn apply_to(&self, profile: &mut UserProfile) {
        for op in self.writes_for(&profile.id.clone()) {
            op.apply(profile);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Total number of queued operations
    pub fn len(&self) -> usize {
        self.writes.iter().map(|w| w.ops.len()).sum()
    }
}

// ----------------------------------------------------------------------------
// Conversation Feed
// ----------------------------------------------------------------------------

/// Live feed of messages appended to one conversation
///
/// Dropping the feed releases the store-side listener.
#[derive(Debug)]
pub struct ConversationFeed {
    key: ConversationKey,
    receiver: broadcast::Receiver<Message>,
}

impl ConversationFeed {
    pub fn new(key: ConversationKey, receiver: broadcast::Receiver<Message>) -> Self {
        Self { key, receiver }
    }

    /// Conversation this feed follows
    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Wait for the next message; `None` once the store side is gone
    ///
    /// A subscriber that falls behind skips the overwritten messages and keeps
    /// going; the skipped ones remain readable through history.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(conversation = %self.key, skipped, "conversation feed lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next message if one is already queued
    pub fn try_recv(&mut self) -> Option<Message> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(conversation = %self.key, skipped, "conversation feed lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
