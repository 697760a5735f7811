//! State persistence for the chatlink CLI
//!
//! Every invocation restores the in-memory backends from one JSON file and
//! writes them back when the command finishes.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use chatlink_core::{AuthSnapshot, StoreSnapshot, UserId};
use chatlink_runtime::PendingVerification;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    /// Profile documents and conversations
    pub store: StoreSnapshot,
    /// Accounts known to the local auth provider
    pub auth: AuthSnapshot,
    /// User whose session is resumed on the next invocation
    pub current_user: Option<UserId>,
    /// Sign-up waiting for email verification
    pub pending: Option<PendingVerification>,
}

impl AppState {
    /// Load state from file; a missing file yields empty state
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let state_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        let state: AppState = serde_json::from_str(&state_str)
            .with_context(|| format!("Failed to parse state file {}", path.display()))?;
        Ok(state)
    }

    /// Save state to file, creating the parent directory if needed
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let state_str = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        std::fs::write(path, state_str)
            .with_context(|| format!("Failed to write state file {}", path.display()))?;
        Ok(())
    }
}
