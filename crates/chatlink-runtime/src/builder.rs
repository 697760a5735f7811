//! Client Builder API
//!
//! Provides a builder-style API for consumers (CLI/tests) to plug in backend
//! collaborators and get a [`ChatClient`]. Collaborators that are not supplied
//! default to the in-memory implementations from `chatlink-core`.

use std::sync::Arc;

use chatlink_core::{
    AuthProvider, ChatlinkConfig, DocumentStore, MediaUploader, MemoryAuthProvider,
    MemoryDocumentStore, MemoryMediaHost, Result, SystemTimeSource, TimeSource,
};
use tracing::info;

use crate::managers::{AuthManager, ChatManager, ProfileManager, RelationshipSynchronizer};
use crate::session::{ClientContext, Session};

// ----------------------------------------------------------------------------
// Client Builder
// ----------------------------------------------------------------------------

/// Builder for a chatlink client
#[derive(Default)]
pub struct ClientBuilder {
    config: ChatlinkConfig,
    store: Option<Arc<dyn DocumentStore>>,
    auth: Option<Arc<dyn AuthProvider>>,
    media: Option<Arc<dyn MediaUploader>>,
    time_source: Option<Arc<dyn TimeSource>>,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client configuration
    pub fn with_config(mut self, config: ChatlinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the given document store
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use the given authentication provider
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Use the given media host
    pub fn with_media(mut self, media: Arc<dyn MediaUploader>) -> Self {
        self.media = Some(media);
        self
    }

    /// Use the given clock for verification windows and timestamps
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Validate the configuration and build the client
    pub fn build(self) -> Result<ChatClient> {
        self.config.validate()?;

        let time_source: Arc<dyn TimeSource> = self
            .time_source
            .unwrap_or_else(|| Arc::new(SystemTimeSource));
        let store: Arc<dyn DocumentStore> = match self.store {
            Some(store) => store,
            None => Arc::new(
                MemoryDocumentStore::with_config(self.config.store.clone())
                    .with_time_source(Arc::clone(&time_source)),
            ),
        };
        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(auth) => auth,
            None => Arc::new(
                MemoryAuthProvider::new(self.config.auth.clone())
                    .with_time_source(Arc::clone(&time_source)),
            ),
        };
        let media: Arc<dyn MediaUploader> = self
            .media
            .unwrap_or_else(|| Arc::new(MemoryMediaHost::new()));

        info!(
            max_message_length = self.config.messages.max_length,
            verification_window_secs = self.config.verification.window_secs,
            "Building chatlink client"
        );

        Ok(ChatClient {
            context: ClientContext {
                store,
                auth,
                media,
                config: self.config,
                time_source,
            },
        })
    }
}

// ----------------------------------------------------------------------------
// Chat Client
// ----------------------------------------------------------------------------

/// Entry point handing out managers
#[derive(Debug, Clone)]
pub struct ChatClient {
    context: ClientContext,
}

impl ChatClient {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    /// Sign-up, verification and sign-in
    pub fn auth(&self) -> AuthManager {
        AuthManager::new(self.context.clone())
    }

    /// Friend operations for a session
    pub fn relationships(&self, session: &Session) -> RelationshipSynchronizer {
        RelationshipSynchronizer::new(session.clone())
    }

    /// Messaging for a session
    pub fn chat(&self, session: &Session) -> ChatManager {
        ChatManager::new(session.clone())
    }

    /// Profile editing for a session
    pub fn profiles(&self, session: &Session) -> ProfileManager {
        ProfileManager::new(session.clone())
    }
}
