//! Encrypted credentials file
//!
//! Credentials are kept as JSON encrypted with AES-256-GCM. The file is the
//! 12-byte nonce followed by the ciphertext; the key is derived from
//! machine-specific identifiers so the file is useless on another machine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result, anyhow};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{
    CredentialStore, Credentials, account_key, account_names, check_credentials, warn_if_stale,
};
use crate::paths;

const NONCE_SIZE: usize = 12;

/// Identifier of this machine, best effort
fn machine_id() -> String {
    #[cfg(target_os = "linux")]
    {
        for source in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(source) {
                let id = id.trim();
                if !id.is_empty() {
                    return id.to_string();
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(uuid) = stdout
                .lines()
                .find(|line| line.contains("IOPlatformUUID"))
                .and_then(|line| line.split('"').nth(3))
            {
                return uuid.to_string();
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(output) = std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(guid) = stdout
                .lines()
                .find(|line| line.contains("MachineGuid"))
                .and_then(|line| line.split_whitespace().last())
            {
                return guid.to_string();
            }
        }
    }

    dirs::home_dir().map_or_else(
        || "threads-cli-fallback-key".to_string(),
        |p| p.to_string_lossy().to_string(),
    )
}

/// Key derived from the machine id and the user's directories
fn machine_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    if let Some(data) = dirs::data_dir() {
        hasher.update(data.to_string_lossy().as_bytes());
    }
    hasher.update(b"threads-cli-credentials-v1");
    hasher.finalize().into()
}

type Entries = BTreeMap<String, Credentials>;

/// Credential store backed by one encrypted file
pub struct EncryptedFileStore {
    path: PathBuf,
    key: [u8; 32],
    // Serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl std::fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EncryptedFileStore {
    /// Store at the default location with the machine key
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(paths::credentials_path()?))
    }

    /// Store at `path` with the machine key
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, machine_key())
    }

    /// Store at `path` with an explicit key
    pub fn with_key(path: impl Into<PathBuf>, key: [u8; 32]) -> Self {
        Self {
            path: path.into(),
            key,
            guard: Mutex::new(()),
        }
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|_| anyhow!("Invalid key length"))
    }

    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let encrypted = fs::read(&self.path).context("Failed to read credentials file")?;
        if encrypted.len() < NONCE_SIZE {
            return Ok(Entries::new());
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt credentials (file from another machine?)"))?;

        serde_json::from_slice(&plaintext).context("Credentials file is corrupted")
    }

    fn save(&self, entries: &Entries) -> Result<()> {
        let json = serde_json::to_vec(entries)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce_bytes);
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), json.as_slice())
            .map_err(|_| anyhow!("Failed to encrypt credentials"))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }
        fs::write(&self.path, output).context("Failed to write credentials file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        debug!(path = %self.path.display(), accounts = entries.len(), "Saved credentials");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Entries)) -> Result<()> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| anyhow!("Credential store lock poisoned"))?;
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl CredentialStore for EncryptedFileStore {
    fn set(&self, name: &str, credentials: &Credentials) -> Result<()> {
        let key = account_key(name)?;
        check_credentials(credentials)?;
        self.update(|entries| {
            entries.insert(key, credentials.clone());
        })
    }

    fn get(&self, name: &str) -> Result<Option<Credentials>> {
        let key = account_key(name)?;
        let found = self.load()?.remove(&key);
        if let Some(credentials) = &found {
            warn_if_stale(name, credentials);
        }
        Ok(found)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let key = account_key(name)?;
        self.update(|entries| {
            entries.remove(&key);
        })
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(account_names(self.load()?.into_keys()))
    }
}
