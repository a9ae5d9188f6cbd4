//! At-rest storage for per-user key records.
//!
//! A record holds the user's public key (base64 SPKI) and the password-encrypted
//! private key produced by [`crate::crypto::export_private_key`]. Nothing in a
//! vault is usable without the owner's password.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const VAULT_VERSION: u8 = 1;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported vault version: {0}")]
    UnsupportedVersion(u8),
}

/// One user's keys as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKeyRecord {
    /// Base64 SPKI DER.
    pub public_key: String,
    /// Base64 `iv || AES-GCM(PKCS#8)`.
    pub encrypted_private_key: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Persistence for [`StoredKeyRecord`]s, keyed by username.
pub trait KeyVault: Send + Sync {
    fn load(&self, username: &str) -> Result<Option<StoredKeyRecord>, VaultError>;

    fn store(&self, username: &str, record: StoredKeyRecord) -> Result<(), VaultError>;
}

/// Vault kept in process memory. Used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryKeyVault {
    records: RwLock<HashMap<String, StoredKeyRecord>>,
}

impl MemoryKeyVault {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyVault for MemoryKeyVault {
    fn load(&self, username: &str) -> Result<Option<StoredKeyRecord>, VaultError> {
        Ok(self.records.read().get(username).cloned())
    }

    fn store(&self, username: &str, record: StoredKeyRecord) -> Result<(), VaultError> {
        self.records.write().insert(username.to_string(), record);
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct VaultFile {
    version: u8,
    users: HashMap<String, StoredKeyRecord>,
}

impl Default for VaultFile {
    fn default() -> Self {
        Self {
            version: VAULT_VERSION,
            users: HashMap::new(),
        }
    }
}

/// Vault stored as one JSON file.
#[derive(Debug)]
pub struct FileKeyVault {
    path: PathBuf,
    // serializes read-modify-write within this process
    lock: RwLock<()>,
}

impl FileKeyVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<VaultFile, VaultError> {
        if !self.path.exists() {
            return Ok(VaultFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let file: VaultFile = serde_json::from_str(&content)?;
        if file.version != VAULT_VERSION {
            return Err(VaultError::UnsupportedVersion(file.version));
        }
        Ok(file)
    }
}

impl KeyVault for FileKeyVault {
    fn load(&self, username: &str) -> Result<Option<StoredKeyRecord>, VaultError> {
        let _guard = self.lock.read();
        Ok(self.read_file()?.users.remove(username))
    }

    fn store(&self, username: &str, record: StoredKeyRecord) -> Result<(), VaultError> {
        let _guard = self.lock.write();
        let mut file = self.read_file()?;
        file.users.insert(username.to_string(), record);
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        tracing::debug!(path = %self.path.display(), "stored key record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(tag: &str) -> StoredKeyRecord {
        StoredKeyRecord {
            public_key: format!("pub-{}", tag),
            encrypted_private_key: format!("priv-{}", tag),
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_memory_vault() {
        let vault = MemoryKeyVault::new();
        assert!(vault.load("alice").unwrap().is_none());

        vault.store("alice", record("a")).unwrap();
        assert_eq!(vault.load("alice").unwrap(), Some(record("a")));
    }

    #[test]
    fn test_file_vault_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.json");

        FileKeyVault::new(&path).store("alice", record("a")).unwrap();
        FileKeyVault::new(&path).store("bob", record("b")).unwrap();

        let reopened = FileKeyVault::new(&path);
        assert_eq!(reopened.load("alice").unwrap(), Some(record("a")));
        assert_eq!(reopened.load("bob").unwrap(), Some(record("b")));
        assert!(reopened.load("carol").unwrap().is_none());
    }

    #[test]
    fn test_file_vault_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let vault = FileKeyVault::new(dir.path().join("absent.json"));
        assert!(vault.load("anyone").unwrap().is_none());
    }

    #[test]
    fn test_file_vault_rejects_unknown_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys.json");
        fs::write(&path, r#"{ "version": 9, "users": {} }"#).unwrap();

        assert!(matches!(
            FileKeyVault::new(&path).load("alice"),
            Err(VaultError::UnsupportedVersion(9))
        ));
    }
}
