//! Insecure "simplified key pair" fallback.
//!
//! **Known-insecure legacy mode.** Older clients without native RSA derived an
//! AES key from SHA-256 of the recipient's exported *public* key. Anyone who
//! holds the public key can decrypt. It exists so those messages still open
//! and is only reachable when `allow_insecure_fallback` is switched on.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

use super::symmetric::{open_bytes_with_key, seal_bytes_with_key, SymmetricError};

/// Symmetric cipher keyed by SHA-256 of an exported public key string.
pub struct InsecureSharedKeyCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for InsecureSharedKeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsecureSharedKeyCipher").finish_non_exhaustive()
    }
}

impl InsecureSharedKeyCipher {
    /// `public_key` is the base64 SPKI string both parties know.
    pub fn new(public_key: &str) -> Self {
        tracing::warn!("using insecure shared-key fallback; public key holders can decrypt");
        Self {
            key: Sha256::digest(public_key.trim().as_bytes()).into(),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SymmetricError> {
        let sealed = seal_bytes_with_key(plaintext.as_bytes(), &self.key)?;
        Ok(BASE64.encode(sealed))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, SymmetricError> {
        let data = BASE64.decode(encoded.trim())?;
        let plaintext = open_bytes_with_key(&data, &self.key)?;
        String::from_utf8(plaintext).map_err(|_| SymmetricError::InvalidUtf8)
    }
}
