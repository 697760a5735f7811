//! Authentication provider seam
//!
//! Email/password accounts with a verification flag. The in-memory provider
//! keeps salted SHA-256 password digests and exposes `confirm_email` in place
//! of the link a real provider would mail out.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use email_address::EmailAddress;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::{ChatlinkError, Result};
use crate::types::{SystemTimeSource, TimeSource, Timestamp, UserId};

// ----------------------------------------------------------------------------
// Provider Trait
// ----------------------------------------------------------------------------

/// Account as reported by the authentication provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub created_at: Timestamp,
}

/// Authentication backend
///
/// Failures carry the provider's own text in [`ChatlinkError::Auth`].
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account; the new account is unverified
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Check credentials and open a provider session
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Close the provider session of `user`
    async fn sign_out(&self, user: &UserId) -> Result<()>;

    /// Send (or resend) the verification email
    async fn send_email_verification(&self, user: &UserId) -> Result<()>;

    /// Fetch the current state of an account
    async fn reload(&self, user: &UserId) -> Result<AuthUser>;

    /// Set the account display name
    async fn update_display_name(&self, user: &UserId, name: &str) -> Result<AuthUser>;
}

// ----------------------------------------------------------------------------
// Snapshot
// ----------------------------------------------------------------------------

/// Stored account: public data plus the password digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub user: AuthUser,
    pub salt: String,
    pub password_digest: String,
    #[serde(default)]
    pub verification_emails: u32,
}

/// Serializable copy of every account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    #[serde(default)]
    pub accounts: BTreeMap<UserId, AccountRecord>,
}

// ----------------------------------------------------------------------------
// Memory Provider
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Accounts {
    records: HashMap<UserId, AccountRecord>,
    by_email: HashMap<String, UserId>,
    signed_in: HashSet<UserId>,
}

impl Accounts {
    fn get_mut(&mut self, user: &UserId) -> Result<&mut AccountRecord> {
        self.records
            .get_mut(user)
            .ok_or_else(|| ChatlinkError::auth("There is no user record corresponding to this identifier."))
    }
}

/// Authentication provider held in process memory
pub struct MemoryAuthProvider {
    accounts: RwLock<Accounts>,
    config: AuthConfig,
    time_source: Arc<dyn TimeSource>,
}

impl core::fmt::Debug for MemoryAuthProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryAuthProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryAuthProvider {
    fn default() -> Self {
        Self::new(AuthConfig::default())
    }
}

impl MemoryAuthProvider {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            accounts: RwLock::new(Accounts::default()),
            config,
            time_source: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the clock used for account creation times
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Rebuild a provider from a snapshot; nobody is signed in afterwards
    pub fn from_snapshot(snapshot: AuthSnapshot, config: AuthConfig) -> Self {
        let mut accounts = Accounts::default();
        for (id, record) in snapshot.accounts {
            accounts
                .by_email
                .insert(normalize_email(&record.user.email), id.clone());
            accounts.records.insert(id, record);
        }
        info!(accounts = accounts.records.len(), "restored auth accounts from snapshot");
        Self {
            accounts: RwLock::new(accounts),
            ..Self::new(config)
        }
    }

    /// Copy every account out of the provider
    pub async fn snapshot(&self) -> AuthSnapshot {
        let accounts = self.accounts.read().await;
        AuthSnapshot {
            accounts: accounts
                .records
                .iter()
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect(),
        }
    }

    /// Mark an account's email as verified, as following the mailed link would
    pub async fn confirm_email(&self, user: &UserId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.get_mut(user)?.user.email_verified = true;
        info!(user = %user, "email confirmed");
        Ok(())
    }

    /// Look up an account id by email
    pub async fn find_by_email(&self, email: &str) -> Option<UserId> {
        self.accounts
            .read()
            .await
            .by_email
            .get(&normalize_email(email))
            .cloned()
    }

    /// Number of verification emails sent to an account
    pub async fn verification_emails_sent(&self, user: &UserId) -> u32 {
        self.accounts
            .read()
            .await
            .records
            .get(user)
            .map(|r| r.verification_emails)
            .unwrap_or(0)
    }

    /// Whether the provider currently holds a session for `user`
    pub async fn is_signed_in(&self, user: &UserId) -> bool {
        self.accounts.read().await.signed_in.contains(user)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if EmailAddress::from_str(email).is_err() {
            return Err(ChatlinkError::auth("The email address is badly formatted."));
        }
        if password.chars().count() < self.config.min_password_length {
            return Err(ChatlinkError::auth(format!(
                "Password should be at least {} characters",
                self.config.min_password_length
            )));
        }

        let mut accounts = self.accounts.write().await;
        let key = normalize_email(email);
        if accounts.by_email.contains_key(&key) {
            return Err(ChatlinkError::auth(
                "The email address is already in use by another account.",
            ));
        }

        let id = UserId::new(Uuid::new_v4().simple().to_string())?;
        let salt = Uuid::new_v4().simple().to_string();
        let user = AuthUser {
            id: id.clone(),
            email: email.to_string(),
            display_name: None,
            email_verified: false,
            created_at: self.time_source.now(),
        };
        let record = AccountRecord {
            user: user.clone(),
            password_digest: digest(&salt, password),
            salt,
            verification_emails: 0,
        };

        accounts.by_email.insert(key, id.clone());
        accounts.records.insert(id.clone(), record);
        accounts.signed_in.insert(id.clone());
        info!(user = %id, "account created");
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut accounts = self.accounts.write().await;
        let invalid = || ChatlinkError::auth("The supplied auth credential is incorrect.");

        let id = accounts
            .by_email
            .get(&normalize_email(email))
            .cloned()
            .ok_or_else(invalid)?;
        let record = accounts.records.get(&id).ok_or_else(invalid)?;
        if digest(&record.salt, password) != record.password_digest {
            debug!(user = %id, "password mismatch");
            return Err(invalid());
        }

        let user = record.user.clone();
        accounts.signed_in.insert(id);
        Ok(user)
    }

    async fn sign_out(&self, user: &UserId) -> Result<()> {
        self.accounts.write().await.signed_in.remove(user);
        debug!(user = %user, "signed out");
        Ok(())
    }

    async fn send_email_verification(&self, user: &UserId) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let record = accounts.get_mut(user)?;
        record.verification_emails += 1;
        info!(user = %user, email = %record.user.email, "verification email sent");
        Ok(())
    }

    async fn reload(&self, user: &UserId) -> Result<AuthUser> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.get_mut(user)?.user.clone())
    }

    async fn update_display_name(&self, user: &UserId, name: &str) -> Result<AuthUser> {
        let mut accounts = self.accounts.write().await;
        let record = accounts.get_mut(user)?;
        record.user.display_name = Some(name.trim().to_string());
        Ok(record.user.clone())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
