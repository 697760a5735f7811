//! Conversation keys and chat messages
//!
//! Both participants of a direct conversation derive the same key on their own:
//! the two user ids in lexicographic order joined by [`KEY_SEPARATOR`]. Since
//! [`UserId`] never contains the separator, a key splits back into exactly one
//! pair of ids.

use core::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MessageConfig;
use crate::errors::{ChatlinkError, Result};
use crate::types::{Timestamp, UserId};

/// Separator between the two ids of a conversation key
pub const KEY_SEPARATOR: char = '_';

// ----------------------------------------------------------------------------
// Conversation Key
// ----------------------------------------------------------------------------

/// Order-independent identifier of a two-party message thread
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationKey(String);

/// Derive the conversation key for a pair of users
pub fn conversation_key(a: &UserId, b: &UserId) -> ConversationKey {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    ConversationKey(format!("{}{}{}", lo, KEY_SEPARATOR, hi))
}

impl ConversationKey {
    /// Parse a key produced by [`conversation_key`]
    pub fn parse(key: &str) -> Result<Self> {
        let (lo, hi) = key.split_once(KEY_SEPARATOR).ok_or_else(|| {
            ChatlinkError::validation("conversation_key", "missing separator")
        })?;
        let lo = UserId::new(lo)?;
        let hi = UserId::new(hi)?;
        if lo > hi {
            return Err(ChatlinkError::validation(
                "conversation_key",
                "participants are not in lexicographic order",
            ));
        }
        Ok(conversation_key(&lo, &hi))
    }

    /// The two participants, smaller id first
    pub fn participants(&self) -> (UserId, UserId) {
        // Construction guarantees both halves are valid ids
        let (lo, hi) = self
            .0
            .split_once(KEY_SEPARATOR)
            .unwrap_or((self.0.as_str(), self.0.as_str()));
        (UserId::from_validated(lo), UserId::from_validated(hi))
    }

    /// Whether `user` takes part in this conversation
    pub fn includes(&self, user: &UserId) -> bool {
        let (lo, hi) = self.participants();
        &lo == user || &hi == user
    }

    /// Borrow the raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConversationKey {
    type Error = ChatlinkError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ConversationKey> for String {
    fn from(key: ConversationKey) -> Self {
        key.0
    }
}

// ----------------------------------------------------------------------------
// Messages
// ----------------------------------------------------------------------------

/// A validated message that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub sender: UserId,
    pub receiver: UserId,
    pub text: String,
}

impl MessageDraft {
    /// Validate an outgoing message against the configured limits
    pub fn new(
        sender: UserId,
        receiver: UserId,
        text: impl Into<String>,
        config: &MessageConfig,
    ) -> Result<Self> {
        let text = text.into();

        if sender == receiver {
            return Err(ChatlinkError::validation(
                "receiver",
                "cannot send a message to yourself",
            ));
        }
        if text.trim().is_empty() {
            return Err(ChatlinkError::validation("text", "message is empty"));
        }
        let length = text.chars().count();
        if length > config.max_length {
            return Err(ChatlinkError::validation(
                "text",
                format!("message is {} characters (max: {})", length, config.max_length),
            ));
        }

        Ok(Self {
            sender,
            receiver,
            text,
        })
    }

    /// Conversation this draft belongs to
    pub fn conversation(&self) -> ConversationKey {
        conversation_key(&self.sender, &self.receiver)
    }

    /// Turn the draft into a stored message with store-assigned metadata
    pub fn into_message(self, created_at: Timestamp, sequence: u64) -> Message {
        Message {
            id: Uuid::new_v4(),
            sender: self.sender,
            receiver: self.receiver,
            text: self.text,
            created_at,
            sequence,
        }
    }
}

/// Immutable stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: UserId,
    pub receiver: UserId,
    pub text: String,
    /// Assigned by the store on append
    pub created_at: Timestamp,
    /// Strictly increasing within a conversation
    pub sequence: u64,
}

impl Message {
    /// Conversation this message belongs to
    pub fn conversation(&self) -> ConversationKey {
        conversation_key(&self.sender, &self.receiver)
    }

    /// Whether `user` wrote this message
    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender == user
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn test_key_is_lexicographic() {
        let key = conversation_key(&id("u2"), &id("u1"));
        assert_eq!(key.as_str(), "u1_u2");
        assert_eq!(key, conversation_key(&id("u1"), &id("u2")));
    }

    #[test]
    fn test_key_uses_byte_order() {
        // Uppercase sorts before lowercase
        let key = conversation_key(&id("alice"), &id("Bob"));
        assert_eq!(key.as_str(), "Bob_alice");
    }

    #[test]
    fn test_parse_round_trip_and_rejections() {
        let key = ConversationKey::parse("u1_u2").unwrap();
        assert_eq!(key.participants(), (id("u1"), id("u2")));
        assert!(key.includes(&id("u2")));
        assert!(!key.includes(&id("u3")));

        assert!(ConversationKey::parse("u2_u1").is_err());
        assert!(ConversationKey::parse("u1u2").is_err());
        assert!(ConversationKey::parse("u1_u2_u3").is_err());
        assert!(ConversationKey::parse("_u2").is_err());
    }

    #[test]
    fn test_draft_validation() {
        let config = MessageConfig::testing();

        let draft = MessageDraft::new(id("u1"), id("u2"), "hello", &config).unwrap();
        assert_eq!(draft.conversation().as_str(), "u1_u2");

        assert!(MessageDraft::new(id("u1"), id("u2"), "   \n", &config).is_err());
        assert!(MessageDraft::new(id("u1"), id("u1"), "hi", &config).is_err());

        let long = "x".repeat(config.max_length + 1);
        assert!(MessageDraft::new(id("u1"), id("u2"), long, &config).is_err());

        let exact = "é".repeat(config.max_length);
        assert!(MessageDraft::new(id("u1"), id("u2"), exact, &config).is_ok());
    }

    #[test]
    fn test_message_keeps_draft_fields() {
        let draft =
            MessageDraft::new(id("u2"), id("u1"), "yo", &MessageConfig::default()).unwrap();
        let message = draft.into_message(Timestamp::new(42), 7);
        assert_eq!(message.conversation().as_str(), "u1_u2");
        assert!(message.is_from(&id("u2")));
        assert_eq!(message.created_at, Timestamp::new(42));
        assert_eq!(message.sequence, 7);
    }
}
