//! In-memory document store
//!
//! Backs the CLI and the test suites. Documents sit behind a single async
//! `RwLock`, so a batch is applied completely before any reader sees it.
//! Availability can be switched off and a single commit can be made to fail,
//! which is how failure paths are exercised.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::conversation::{ConversationKey, Message, MessageDraft};
use crate::errors::{ChatlinkError, Result, StoreError};
use crate::profile::{ProfileUpdate, UserProfile};
use crate::store::{ConversationFeed, DocumentStore, ProfileQuery, WriteBatch};
use crate::types::{SystemTimeSource, TimeSource, UserId};

// ----------------------------------------------------------------------------
// Snapshot
// ----------------------------------------------------------------------------

/// Serializable copy of every document in the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub profiles: BTreeMap<UserId, UserProfile>,
    #[serde(default)]
    pub conversations: BTreeMap<ConversationKey, Vec<Message>>,
}

// ----------------------------------------------------------------------------
// Memory Store
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Documents {
    profiles: HashMap<UserId, UserProfile>,
    conversations: HashMap<ConversationKey, Vec<Message>>,
}

/// Document store held entirely in process memory
pub struct MemoryDocumentStore {
    documents: RwLock<Documents>,
    feeds: DashMap<ConversationKey, broadcast::Sender<Message>>,
    config: StoreConfig,
    time_source: Arc<dyn TimeSource>,
    available: AtomicBool,
    fail_next_commit: AtomicBool,
}

impl core::fmt::Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryDocumentStore")
            .field("config", &self.config)
            .field("available", &self.is_available())
            .field("feeds", &self.feeds.len())
            .finish()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// Empty store with default configuration and the system clock
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Empty store with the given configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            documents: RwLock::new(Documents::default()),
            feeds: DashMap::new(),
            config,
            time_source: Arc::new(SystemTimeSource),
            available: AtomicBool::new(true),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Replace the clock used for `created_at` and `updated_at`
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Rebuild a store from a snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot, config: StoreConfig) -> Self {
        let store = Self::with_config(config);
        let documents = Documents {
            profiles: snapshot.profiles.into_iter().collect(),
            conversations: snapshot.conversations.into_iter().collect(),
        };
        info!(
            profiles = documents.profiles.len(),
            conversations = documents.conversations.len(),
            "restored document store from snapshot"
        );
        Self {
            documents: RwLock::new(documents),
            ..store
        }
    }

    /// Copy every document out of the store
    pub async fn snapshot(&self) -> StoreSnapshot {
        let documents = self.documents.read().await;
        StoreSnapshot {
            profiles: documents
                .profiles
                .iter()
                .map(|(id, p)| (id.clone(), p.clone()))
                .collect(),
            conversations: documents
                .conversations
                .iter()
                .map(|(key, m)| (key.clone(), m.clone()))
                .collect(),
        }
    }

    /// Simulate losing or regaining the backend connection
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Make the next `commit` fail with a rejected-commit error
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of stored profile documents
    pub async fn profile_count(&self) -> usize {
        self.documents.read().await.profiles.len()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ChatlinkError::unavailable("document store is offline"))
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>> {
        self.ensure_available()?;
        Ok(self.documents.read().await.profiles.get(id).cloned())
    }

    async fn create_profile(&self, profile: UserProfile) -> Result<()> {
        self.ensure_available()?;
        let mut documents = self.documents.write().await;
        if documents.profiles.contains_key(&profile.id) {
            return Err(StoreError::DocumentExists {
                id: profile.id.to_string(),
            }
            .into());
        }
        debug!(user = %profile.id, "creating profile document");
        documents.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<UserProfile> {
        self.ensure_available()?;
        let now = self.time_source.now();
        let mut documents = self.documents.write().await;
        let profile = documents
            .profiles
            .get_mut(id)
            .ok_or_else(|| ChatlinkError::not_found(id.as_str()))?;
        profile.apply_update(update, now)?;
        Ok(profile.clone())
    }

    async fn set_avatar(&self, id: &UserId, url: &str) -> Result<UserProfile> {
        self.ensure_available()?;
        let now = self.time_source.now();
        let mut documents = self.documents.write().await;
        let profile = documents
            .profiles
            .get_mut(id)
            .ok_or_else(|| ChatlinkError::not_found(id.as_str()))?;
        profile.avatar = Some(url.to_string());
        profile.updated_at = now;
        Ok(profile.clone())
    }

    async fn query_profiles(&self, query: &ProfileQuery) -> Result<Vec<UserProfile>> {
        self.ensure_available()?;
        if let ProfileQuery::Members(ids) = query {
            if ids.len() > self.config.membership_query_limit {
                return Err(StoreError::QueryTooLarge {
                    requested: ids.len(),
                    max: self.config.membership_query_limit,
                }
                .into());
            }
        }

        let documents = self.documents.read().await;
        let mut profiles: Vec<UserProfile> = match query {
            ProfileQuery::All => documents.profiles.values().cloned().collect(),
            ProfileQuery::Excluding(excluded) => documents
                .profiles
                .values()
                .filter(|p| &p.id != excluded)
                .cloned()
                .collect(),
            ProfileQuery::Members(ids) => ids
                .iter()
                .filter_map(|id| documents.profiles.get(id))
                .cloned()
                .collect(),
        };
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles.dedup_by(|a, b| a.id == b.id);
        Ok(profiles)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.ensure_available()?;
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            warn!(operations = batch.len(), "injected commit failure");
            return Err(ChatlinkError::commit_rejected("injected failure"));
        }

        let now = self.time_source.now();
        let mut documents = self.documents.write().await;

        // Every target must exist before anything is written
        if let Some(missing) = batch
            .documents()
            .find(|id| !documents.profiles.contains_key(*id))
        {
            return Err(ChatlinkError::not_found(missing.as_str()));
        }

        for write in batch.writes() {
            if let Some(profile) = documents.profiles.get_mut(&write.user) {
                for op in &write.ops {
                    op.apply(profile);
                }
                profile.updated_at = now;
            }
        }

        debug!(
            documents = batch.writes().len(),
            operations = batch.len(),
            "committed write batch"
        );
        Ok(())
    }

    async fn append_message(&self, draft: MessageDraft) -> Result<Message> {
        self.ensure_available()?;
        let key = draft.conversation();
        let now = self.time_source.now();

        let message = {
            let mut documents = self.documents.write().await;
            let thread = documents.conversations.entry(key.clone()).or_default();
            let sequence = thread.last().map(|m| m.sequence + 1).unwrap_or(0);
            let message = draft.into_message(now, sequence);
            thread.push(message.clone());
            message
        };

        if let Some(sender) = self.feeds.get(&key) {
            // No live receivers is not an error
            let _ = sender.send(message.clone());
        }

        debug!(conversation = %key, sequence = message.sequence, "appended message");
        Ok(message)
    }

    async fn messages(&self, key: &ConversationKey, limit: usize) -> Result<Vec<Message>> {
        self.ensure_available()?;
        let documents = self.documents.read().await;
        let mut thread = documents
            .conversations
            .get(key)
            .cloned()
            .unwrap_or_default();
        thread.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        let skip = thread.len().saturating_sub(limit);
        Ok(thread.split_off(skip))
    }

    async fn subscribe_conversation(&self, key: &ConversationKey) -> Result<ConversationFeed> {
        self.ensure_available()?;
        let receiver = self
            .feeds
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(self.config.subscription_buffer_size).0)
            .subscribe();
        debug!(conversation = %key, "subscribed to conversation");
        Ok(ConversationFeed::new(key.clone(), receiver))
    }

    fn listener_count(&self, key: &ConversationKey) -> usize {
        self.feeds
            .get(key)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
