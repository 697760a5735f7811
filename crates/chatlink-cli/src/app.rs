//! chatlink CLI application: persisted in-memory backends plus a client

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use chatlink_core::{MemoryAuthProvider, MemoryDocumentStore, MemoryMediaHost};
use chatlink_runtime::{ChatClient, Session};

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::state::AppState;

/// Client wired to backends restored from the state file
pub struct ChatlinkApp {
    config: AppConfig,
    state: AppState,
    state_path: PathBuf,
    store: Arc<MemoryDocumentStore>,
    auth: Arc<MemoryAuthProvider>,
    client: ChatClient,
}

impl ChatlinkApp {
    /// Restore backends from the configured state file and build the client
    pub fn new(config: AppConfig) -> Result<Self> {
        let state_path = config.state_path();
        let state = AppState::load_from_file(&state_path)?;
        debug!(path = %state_path.display(), "loaded application state");

        let store = Arc::new(MemoryDocumentStore::from_snapshot(
            state.store.clone(),
            config.core.store.clone(),
        ));
        let auth = Arc::new(MemoryAuthProvider::from_snapshot(
            state.auth.clone(),
            config.core.auth.clone(),
        ));

        let client = ChatClient::builder()
            .with_config(config.core.clone())
            .with_store(store.clone())
            .with_auth(auth.clone())
            .with_media(Arc::new(MemoryMediaHost::new()))
            .build()?;

        Ok(Self {
            config,
            state,
            state_path,
            store,
            auth,
            client,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Local auth backend, for operations only a local provider offers
    pub fn auth_backend(&self) -> &MemoryAuthProvider {
        &self.auth
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Resume the remembered user's session
    pub async fn session(&self) -> Result<Session> {
        let user = self
            .state
            .current_user
            .as_ref()
            .ok_or(CliError::NotSignedIn)?;
        let session = self.client.auth().resume(user).await?;
        Ok(session)
    }

    /// Write both backends and the session bookkeeping back to disk
    pub async fn save(&mut self) -> Result<()> {
        self.state.store = self.store.snapshot().await;
        self.state.auth = self.auth.snapshot().await;
        self.state.save_to_file(&self.state_path)?;
        info!(path = %self.state_path.display(), "saved application state");
        Ok(())
    }
}
