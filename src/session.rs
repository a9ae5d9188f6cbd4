//! Per-session key pair lifecycle.
//!
//! ```text
//! NoKeyPair ──login (first)──▶ Generated ──export──▶ AtRest ──▶ Cached
//!                                  AtRest ──login──▶ Cached
//!                                  Cached ──logout──▶ AtRest
//! ```
//!
//! The [`SessionKeyCache`] lives inside a [`KeyPairManager`] that the caller
//! owns; there is no process-global state. The login flow is the only writer.
//! Readers that miss the cache get [`SessionError::NotLoaded`] and should treat
//! the message as undecryptable by this layer.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::crypto::keys::{export_private_key, export_public_key, import_private_key, KeyError, RsaKeyPair};
use crate::crypto::symmetric::now_millis;
use crate::vault::{KeyVault, StoredKeyRecord, VaultError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("No key pair loaded for {0} in this session")]
    NotLoaded(String),

    #[error("Keys for {0} are cached but have no stored record")]
    MissingRecord(String),

    #[error("Background key task failed: {0}")]
    TaskFailed(String),
}

/// Where a user's key pair currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPairState {
    NoKeyPair,
    /// Encrypted record exists; not unlocked this session.
    AtRest,
    Cached,
}

/// Progress reported during login, for "generating keys…" style UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    UnlockingKeys,
    GeneratingKeys,
    Ready,
}

/// In-memory username → key pair map. Never serialized.
#[derive(Debug, Default)]
pub struct SessionKeyCache {
    keys: RwLock<HashMap<String, Arc<RsaKeyPair>>>,
}

impl SessionKeyCache {
    pub fn get(&self, username: &str) -> Option<Arc<RsaKeyPair>> {
        self.keys.read().get(username).cloned()
    }

    pub fn insert(&self, username: &str, key_pair: Arc<RsaKeyPair>) {
        self.keys.write().insert(username.to_string(), key_pair);
    }

    pub fn remove(&self, username: &str) -> bool {
        self.keys.write().remove(username).is_some()
    }

    pub fn clear(&self) {
        self.keys.write().clear();
    }

    pub fn contains(&self, username: &str) -> bool {
        self.keys.read().contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

/// Generates an RSA key pair without blocking the async runtime.
pub async fn generate_key_pair_async() -> Result<RsaKeyPair, SessionError> {
    tokio::task::spawn_blocking(RsaKeyPair::generate)
        .await
        .map_err(|e| SessionError::TaskFailed(e.to_string()))?
        .map_err(SessionError::from)
}

/// Owns the at-rest vault and the session cache for a set of users.
pub struct KeyPairManager<V: KeyVault> {
    vault: V,
    cache: SessionKeyCache,
    // one login at a time per user, held across load -> generate -> store
    login_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<V: KeyVault> KeyPairManager<V> {
    pub fn new(vault: V) -> Self {
        Self {
            vault,
            cache: SessionKeyCache::default(),
            login_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn cache(&self) -> &SessionKeyCache {
        &self.cache
    }

    /// Unlocks (or on first login, creates) the user's key pair and caches it.
    pub fn login(&self, username: &str, password: &str) -> Result<Arc<RsaKeyPair>, SessionError> {
        self.login_with_progress(username, password, |_| {})
    }

    /// [`login`](Self::login) with stage callbacks.
    ///
    /// The password is checked against the stored record on every call, even
    /// when the key pair is already cached.
    pub fn login_with_progress(
        &self,
        username: &str,
        password: &str,
        mut on_stage: impl FnMut(LoginStage),
    ) -> Result<Arc<RsaKeyPair>, SessionError> {
        let user_lock = self.user_lock(username);
        let _guard = user_lock.lock();

        let key_pair = match self.vault.load(username)? {
            Some(record) => {
                on_stage(LoginStage::UnlockingKeys);
                let unlocked = unlock_record(username, &record, password)?;
                if let Some(cached) = self.cache.get(username) {
                    if cached.public_key() != unlocked.public_key() {
                        tracing::warn!(user = username, "cached key pair does not match stored record");
                        return Err(KeyError::InvalidPrivateKey.into());
                    }
                    on_stage(LoginStage::Ready);
                    return Ok(cached);
                }
                tracing::info!(user = username, "unlocked key pair");
                unlocked
            }
            None if self.cache.contains(username) => {
                return Err(SessionError::MissingRecord(username.to_string()));
            }
            None => {
                on_stage(LoginStage::GeneratingKeys);
                let key_pair = RsaKeyPair::generate()?;
                let record = StoredKeyRecord {
                    public_key: export_public_key(key_pair.public_key())?,
                    encrypted_private_key: export_private_key(key_pair.private_key(), password)?,
                    created_at: now_millis(),
                };
                self.vault.store(username, record)?;
                tracing::info!(user = username, "generated and stored new key pair");
                key_pair
            }
        };

        let key_pair = Arc::new(key_pair);
        self.cache.insert(username, Arc::clone(&key_pair));
        on_stage(LoginStage::Ready);
        Ok(key_pair)
    }

    fn user_lock(&self, username: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.login_locks.lock().entry(username.to_string()).or_default())
    }

    /// Drops the user's keys from the session. The encrypted record stays.
    pub fn logout(&self, username: &str) -> bool {
        let removed = self.cache.remove(username);
        if removed {
            tracing::info!(user = username, "cleared cached key pair");
        }
        removed
    }

    pub fn logout_all(&self) {
        self.cache.clear();
        tracing::info!("cleared all cached key pairs");
    }

    /// The user's cached key pair, or [`SessionError::NotLoaded`].
    pub fn key_pair(&self, username: &str) -> Result<Arc<RsaKeyPair>, SessionError> {
        self.cache
            .get(username)
            .ok_or_else(|| SessionError::NotLoaded(username.to_string()))
    }

    /// The user's distributable public key, if they have ever logged in.
    pub fn public_key_of(&self, username: &str) -> Result<Option<String>, SessionError> {
        Ok(self.vault.load(username)?.map(|record| record.public_key))
    }

    pub fn state(&self, username: &str) -> Result<KeyPairState, SessionError> {
        if self.cache.contains(username) {
            return Ok(KeyPairState::Cached);
        }
        Ok(match self.vault.load(username)? {
            Some(_) => KeyPairState::AtRest,
            None => KeyPairState::NoKeyPair,
        })
    }
}

/// Decrypts a stored private key and checks it against the stored public key.
fn unlock_record(
    username: &str,
    record: &StoredKeyRecord,
    password: &str,
) -> Result<RsaKeyPair, SessionError> {
    let private = import_private_key(&record.encrypted_private_key, password).map_err(|e| {
        tracing::warn!(user = username, "failed to unlock stored private key");
        e
    })?;
    let key_pair = RsaKeyPair::from_private_key(private);
    if export_public_key(key_pair.public_key())? != record.public_key {
        tracing::warn!(user = username, "stored public key does not match private key");
        return Err(KeyError::InvalidPrivateKey.into());
    }
    Ok(key_pair)
}

impl<V: KeyVault + 'static> KeyPairManager<V> {
    /// Runs [`login`](Self::login) on the blocking pool.
    pub async fn login_async(
        self: Arc<Self>,
        username: String,
        password: String,
    ) -> Result<Arc<RsaKeyPair>, SessionError> {
        tokio::task::spawn_blocking(move || self.login(&username, &password))
            .await
            .map_err(|e| SessionError::TaskFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::asymmetric::{decrypt_message, encrypt_message};
    use crate::crypto::keys::import_public_key;
    use crate::vault::MemoryKeyVault;

    #[test]
    fn test_first_login_generates_and_caches() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());
        assert_eq!(manager.state("alice").unwrap(), KeyPairState::NoKeyPair);

        let mut stages = Vec::new();
        manager
            .login_with_progress("alice", "pw", |stage| stages.push(stage))
            .unwrap();

        assert_eq!(stages, vec![LoginStage::GeneratingKeys, LoginStage::Ready]);
        assert_eq!(manager.state("alice").unwrap(), KeyPairState::Cached);
        assert!(manager.public_key_of("alice").unwrap().is_some());
    }

    #[test]
    fn test_logout_then_login_unlocks_same_keys() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());
        let first = manager.login("alice", "pw").unwrap();

        assert!(manager.logout("alice"));
        assert_eq!(manager.state("alice").unwrap(), KeyPairState::AtRest);
        assert!(matches!(manager.key_pair("alice"), Err(SessionError::NotLoaded(_))));

        let mut stages = Vec::new();
        let second = manager
            .login_with_progress("alice", "pw", |stage| stages.push(stage))
            .unwrap();

        assert_eq!(stages, vec![LoginStage::UnlockingKeys, LoginStage::Ready]);
        assert_eq!(first.public_key(), second.public_key());
    }

    #[test]
    fn test_wrong_password_on_unlock() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());
        manager.login("alice", "pw").unwrap();
        manager.logout("alice");

        let result = manager.login("alice", "not-pw");
        assert!(matches!(
            result,
            Err(SessionError::Key(KeyError::WrongPasswordOrCorrupted))
        ));
        assert_eq!(manager.state("alice").unwrap(), KeyPairState::AtRest);
    }

    #[test]
    fn test_cached_login_wrong_password_fails() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());
        let first = manager.login("alice", "right").unwrap();

        let result = manager.login("alice", "totally-wrong");
        assert!(matches!(
            result,
            Err(SessionError::Key(KeyError::WrongPasswordOrCorrupted))
        ));

        // Still cached, and the right password still returns the same keys.
        assert_eq!(manager.state("alice").unwrap(), KeyPairState::Cached);
        let again = manager.login("alice", "right").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_mismatched_stored_public_key_rejected() {
        let owner = RsaKeyPair::generate().unwrap();
        let stranger = RsaKeyPair::generate().unwrap();
        let vault = MemoryKeyVault::new();
        vault
            .store(
                "dave",
                StoredKeyRecord {
                    public_key: export_public_key(stranger.public_key()).unwrap(),
                    encrypted_private_key: export_private_key(owner.private_key(), "pw").unwrap(),
                    created_at: 0,
                },
            )
            .unwrap();

        let manager = KeyPairManager::new(vault);
        assert!(matches!(
            manager.login("dave", "pw"),
            Err(SessionError::Key(KeyError::InvalidPrivateKey))
        ));
        assert!(!manager.cache().contains("dave"));
    }

    #[test]
    fn test_cached_without_record_is_rejected() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());
        manager
            .cache()
            .insert("erin", Arc::new(RsaKeyPair::generate().unwrap()));

        assert!(matches!(
            manager.login("erin", "pw"),
            Err(SessionError::MissingRecord(_))
        ));
    }

    #[test]
    fn test_concurrent_first_logins_share_one_key_pair() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());

        let (a, b) = std::thread::scope(|s| {
            let a = s.spawn(|| manager.login("frank", "pw").unwrap());
            let b = s.spawn(|| manager.login("frank", "pw").unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });

        assert_eq!(a.public_key(), b.public_key());
        let stored = manager.public_key_of("frank").unwrap().unwrap();
        assert_eq!(export_public_key(a.public_key()).unwrap(), stored);
        assert_eq!(
            export_public_key(manager.key_pair("frank").unwrap().public_key()).unwrap(),
            stored
        );
    }

    #[test]
    fn test_distributed_public_key_encrypts_for_owner() {
        let manager = KeyPairManager::new(MemoryKeyVault::new());
        let bob = manager.login("bob", "bob-pw").unwrap();

        let bob_public = import_public_key(&manager.public_key_of("bob").unwrap().unwrap()).unwrap();
        let ciphertext = encrypt_message("hi bob", &bob_public).unwrap();

        assert_eq!(decrypt_message(&ciphertext, bob.private_key()).unwrap(), "hi bob");
    }

    #[test]
    fn test_cache_is_per_user() {
        let cache = SessionKeyCache::default();
        let kp = Arc::new(RsaKeyPair::generate().unwrap());
        cache.insert("alice", Arc::clone(&kp));

        assert!(cache.contains("alice"));
        assert!(cache.get("bob").is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_async_generation_and_login() {
        let kp = generate_key_pair_async().await.unwrap();
        let ct = encrypt_message("async", kp.public_key()).unwrap();
        assert_eq!(decrypt_message(&ct, kp.private_key()).unwrap(), "async");

        let manager = Arc::new(KeyPairManager::new(MemoryKeyVault::new()));
        Arc::clone(&manager)
            .login_async("carol".to_string(), "pw".to_string())
            .await
            .unwrap();
        assert_eq!(manager.state("carol").unwrap(), KeyPairState::Cached);
    }
}
