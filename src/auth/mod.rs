//! Account credentials and where they are kept
//!
//! The client core only sees the [`CredentialStore`] trait: an opaque
//! key-value store keyed by account name. Two implementations ship here:
//! [`EncryptedFileStore`] for the CLI and [`MemoryStore`] for tests and
//! embedders that manage persistence themselves.

mod file;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::RwLock;

use anyhow::{Result, bail};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::TokenInfo;

pub use file::EncryptedFileStore;

/// Key prefix for account entries
const ACCOUNT_PREFIX: &str = "account:";

/// Long-lived tokens should be refreshed within this many days of issue
pub const ROTATION_DAYS: i64 = 55;

/// Start warning this many days before rotation is due
pub const ROTATION_WARNING_DAYS: i64 = 5;

/// Everything stored for one account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token
    pub access_token: String,
    /// Threads user id
    pub user_id: String,
    /// Handle, for display
    #[serde(default)]
    pub username: String,
    /// Token expiry (`None` = unknown)
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// When the token was obtained
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Credentials {
    /// Credentials obtained now
    pub fn new(
        access_token: impl Into<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            user_id: user_id.into(),
            username: username.into(),
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Snapshot of a client's token
    pub fn from_token_info(info: &TokenInfo, username: impl Into<String>) -> Self {
        Self {
            access_token: info.access_token.clone(),
            user_id: info.user_id.clone(),
            username: username.into(),
            expires_at: info.expires_at,
            created_at: info.created_at,
        }
    }

    /// Token to install on a client
    pub fn to_token_info(&self) -> TokenInfo {
        TokenInfo {
            access_token: self.access_token.clone(),
            token_type: "bearer".to_string(),
            expires_at: self.expires_at,
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }

    /// Whether the expiry has passed (false without an expiry)
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Whether the token expires within `window`
    pub fn is_expiring_soon(&self, window: Duration) -> bool {
        self.expires_at.is_some_and(|at| at - Utc::now() <= window)
    }

    /// Whole days left, -1 without an expiry
    pub fn days_until_expiry(&self) -> i64 {
        self.expires_at
            .map_or(-1, |at| (at - Utc::now()).num_days().max(0))
    }

    /// Whether the token is in the last days of its rotation window
    pub fn rotation_due(&self) -> bool {
        Utc::now() - self.created_at >= Duration::days(ROTATION_DAYS - ROTATION_WARNING_DAYS)
    }
}

/// Trimmed, lowercased account name
pub fn normalize_account(name: &str) -> String {
    name.trim().to_lowercase()
}

fn account_key(name: &str) -> Result<String> {
    let name = normalize_account(name);
    if name.is_empty() {
        bail!("Account name must not be empty");
    }
    Ok(format!("{ACCOUNT_PREFIX}{name}"))
}

fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.access_token.trim().is_empty() {
        bail!("Access token must not be empty");
    }
    Ok(())
}

fn warn_if_stale(name: &str, credentials: &Credentials) {
    if credentials.is_expired() {
        warn!(account = name, "Stored token has expired");
    } else if credentials.rotation_due() {
        warn!(
            account = name,
            days_left = credentials.days_until_expiry(),
            "Stored token should be refreshed soon"
        );
    }
}

fn account_names(keys: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = keys
        .filter_map(|k| k.strip_prefix(ACCOUNT_PREFIX).map(str::to_string))
        .collect();
    names.sort();
    names
}

/// Opaque key-value store for account credentials
pub trait CredentialStore: Send + Sync {
    /// Save or replace an account
    fn set(&self, name: &str, credentials: &Credentials) -> Result<()>;

    /// Load an account, `None` when absent
    fn get(&self, name: &str) -> Result<Option<Credentials>>;

    /// Remove an account (absent accounts are fine)
    fn delete(&self, name: &str) -> Result<()>;

    /// Stored account names, sorted
    fn list(&self) -> Result<Vec<String>>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Credentials>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn set(&self, name: &str, credentials: &Credentials) -> Result<()> {
        let key = account_key(name)?;
        check_credentials(credentials)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))?;
        entries.insert(key, credentials.clone());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Credentials>> {
        let key = account_key(name)?;
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))?;
        let found = entries.get(&key).cloned();
        if let Some(credentials) = &found {
            warn_if_stale(name, credentials);
        }
        Ok(found)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let key = account_key(name)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))?;
        entries.remove(&key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow::anyhow!("Credential store lock poisoned"))?;
        Ok(account_names(entries.keys().cloned()))
    }
}
