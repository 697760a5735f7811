//! Direct messaging between two users
//!
//! Every conversation is addressed by its [`ConversationKey`], which both
//! participants derive on their own. Live subscriptions are tracked in a
//! registry so the client can tell which conversations it is following; a
//! subscription releases its store listener and its registry entry when it
//! is dropped.

use std::sync::Arc;

use chatlink_core::{
    conversation_key, ConversationFeed, ConversationKey, Message, MessageDraft, Result, UserId,
};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::Session;

type Registry = Arc<DashMap<Uuid, ConversationKey>>;

// ----------------------------------------------------------------------------
// Chat Manager
// ----------------------------------------------------------------------------

/// Sends, reads and follows conversations for one session
#[derive(Debug, Clone)]
pub struct ChatManager {
    session: Session,
    subscriptions: Registry,
}

impl ChatManager {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            subscriptions: Arc::new(DashMap::new()),
        }
    }

    /// Key of the conversation with `counterpart`
    pub fn conversation_with(&self, counterpart: &UserId) -> ConversationKey {
        conversation_key(self.session.user_id(), counterpart)
    }

    /// Send a message to `receiver`
    pub async fn send_message(&self, receiver: &UserId, text: &str) -> Result<Message> {
        let draft = MessageDraft::new(
            self.session.user_id().clone(),
            receiver.clone(),
            text,
            &self.session.config().messages,
        )?;
        let message = self.session.store().append_message(draft).await?;
        info!(
            conversation = %message.conversation(),
            sequence = message.sequence,
            "message sent"
        );
        Ok(message)
    }

    /// Recent messages with `counterpart`, oldest first
    pub async fn history(&self, counterpart: &UserId) -> Result<Vec<Message>> {
        let key = self.conversation_with(counterpart);
        let limit = self.session.config().messages.history_limit;
        self.session.store().messages(&key, limit).await
    }

    /// Follow new messages in the conversation with `counterpart`
    pub async fn subscribe(&self, counterpart: &UserId) -> Result<ConversationSubscription> {
        let key = self.conversation_with(counterpart);
        let feed = self.session.store().subscribe_conversation(&key).await?;
        let id = Uuid::new_v4();
        self.subscriptions.insert(id, key.clone());
        debug!(conversation = %key, subscription = %id, "subscription opened");

        Ok(ConversationSubscription {
            id,
            feed,
            registry: Arc::clone(&self.subscriptions),
        })
    }

    /// Number of subscriptions this manager currently holds open
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Conversations this manager is currently following
    pub fn followed_conversations(&self) -> Vec<ConversationKey> {
        let mut keys: Vec<ConversationKey> = self
            .subscriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Live listeners on the conversation with `counterpart`, across all clients
    pub fn listener_count(&self, counterpart: &UserId) -> usize {
        self.session
            .store()
            .listener_count(&self.conversation_with(counterpart))
    }
}

// ----------------------------------------------------------------------------
// Conversation Subscription
// ----------------------------------------------------------------------------

/// Handle to a live conversation feed; dropping it unsubscribes
#[derive(Debug)]
pub struct ConversationSubscription {
    id: Uuid,
    feed: ConversationFeed,
    registry: Registry,
}

impl ConversationSubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn conversation(&self) -> &ConversationKey {
        self.feed.key()
    }

    /// Wait for the next message in the conversation
    pub async fn next_message(&mut self) -> Option<Message> {
        self.feed.recv().await
    }

    /// Take a message if one is already waiting
    pub fn try_next_message(&mut self) -> Option<Message> {
        self.feed.try_recv()
    }

    /// Stop following the conversation
    pub fn unsubscribe(self) {}
}

impl Drop for ConversationSubscription {
    fn drop(&mut self) {
        self.registry.remove(&self.id);
        debug!(conversation = %self.feed.key(), subscription = %self.id, "subscription released");
    }
}
