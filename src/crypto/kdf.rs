//! Password-based key derivation (PBKDF2-HMAC-SHA256).
//!
//! Every symmetric key in fogwhisper comes out of [`derive_key`]. The iteration
//! count is chosen by the caller because three different operations use three
//! different counts, and each stored format depends on its own:
//!
//! | Operation                         | Iterations                         |
//! |-----------------------------------|------------------------------------|
//! | Message encryption (AES-256-GCM)  | [`AES_KEY_ITERATIONS`] (600,000)   |
//! | Private key wrapping              | [`PRIVATE_KEY_ITERATIONS`] (100,000)|
//! | Login password hashing            | [`PASSWORD_HASH_ITERATIONS`] (10,000)|

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Iterations for the primary message-encryption path.
pub const AES_KEY_ITERATIONS: u32 = 600_000;

/// Iterations for wrapping an exported private key.
pub const PRIVATE_KEY_ITERATIONS: u32 = 100_000;

/// Iterations for login credential hashing.
pub const PASSWORD_HASH_ITERATIONS: u32 = 10_000;

/// A 256-bit key together with the salt it was derived with.
///
/// The key bytes are wiped when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LEN],
    #[zeroize(skip)]
    salt: [u8; SALT_LEN],
}

impl DerivedKey {
    /// Returns the raw key bytes.
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Returns the salt used for this derivation.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("salt", &hex::encode(self.salt))
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generates a fresh random salt from the OS RNG.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derives a 256-bit key from `password`.
///
/// When `salt` is `None` a fresh random salt is generated. The result is
/// deterministic for identical `(password, salt, iterations)`.
pub fn derive_key(password: &str, salt: Option<[u8; SALT_LEN]>, iterations: u32) -> DerivedKey {
    let salt = salt.unwrap_or_else(random_salt);
    DerivedKey {
        key: derive_raw(password.as_bytes(), &salt, iterations),
        salt,
    }
}

/// Derives key bytes from an arbitrary-length salt.
///
/// Used where the salt is a fixed constant rather than a random 16-byte value.
pub fn derive_raw(password: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}
