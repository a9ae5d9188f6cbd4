//! Direct RSA-OAEP (SHA-256) message encryption.
//!
//! One RSA block per message, no chunking. A 2048-bit key carries at most
//! 190 bytes of plaintext; longer input is rejected before any ciphertext is
//! produced. Callers with longer text wrap it with the symmetric layer first.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;

/// SHA-256 digest size, used by the OAEP overhead formula.
const HASH_LEN: usize = 32;

/// Literal shown by legacy call sites when the RSA layer cannot be removed.
pub const RSA_DECRYPTION_FAILED: &str = "🔒 [RSA Encrypted - Decryption failed]";

/// Errors that can occur during asymmetric encryption operations.
#[derive(Error, Debug)]
pub enum AsymmetricError {
    #[error("Message too long for RSA-OAEP: {len} bytes, maximum {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Invalid base64 ciphertext: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Decrypted data is not valid UTF-8")]
    InvalidUtf8,
}

/// Maximum plaintext bytes one OAEP block can carry for `key`.
pub fn max_message_len(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(2 * HASH_LEN + 2)
}

/// Encrypts `plaintext` for the holder of `recipient`'s private key.
pub fn encrypt_message(plaintext: &str, recipient: &RsaPublicKey) -> Result<String, AsymmetricError> {
    let max = max_message_len(recipient);
    if plaintext.len() > max {
        return Err(AsymmetricError::MessageTooLong {
            len: plaintext.len(),
            max,
        });
    }

    let ciphertext = recipient
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext.as_bytes())
        .map_err(|e| AsymmetricError::EncryptionFailed(e.to_string()))?;
    tracing::debug!(bytes = plaintext.len(), "RSA-OAEP encrypted message");
    Ok(BASE64.encode(ciphertext))
}

/// Decrypts a base64 RSA-OAEP ciphertext with our own private key.
pub fn decrypt_message(encoded: &str, own_key: &RsaPrivateKey) -> Result<String, AsymmetricError> {
    let ciphertext = BASE64.decode(encoded.trim())?;
    let plaintext = own_key
        .decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .map_err(|_| AsymmetricError::DecryptionFailed)?;
    String::from_utf8(plaintext).map_err(|_| AsymmetricError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::RsaKeyPair;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let kp = RsaKeyPair::generate().unwrap();
        let encrypted = encrypt_message("Hello, recipient!", kp.public_key()).unwrap();
        let decrypted = decrypt_message(&encrypted, kp.private_key()).unwrap();

        assert_eq!(decrypted, "Hello, recipient!");
    }

    #[test]
    fn test_capacity_limit() {
        let kp = RsaKeyPair::generate().unwrap();
        assert_eq!(max_message_len(kp.public_key()), 190);

        let exact = "a".repeat(190);
        let encrypted = encrypt_message(&exact, kp.public_key()).unwrap();
        assert_eq!(decrypt_message(&encrypted, kp.private_key()).unwrap(), exact);

        let too_long = "a".repeat(191);
        assert!(matches!(
            encrypt_message(&too_long, kp.public_key()),
            Err(AsymmetricError::MessageTooLong { len: 191, max: 190 })
        ));
    }

    #[test]
    fn test_capacity_counts_bytes() {
        let kp = RsaKeyPair::generate().unwrap();
        // 64 four-byte characters = 256 bytes
        let emoji = "🦀".repeat(64);
        assert!(matches!(
            encrypt_message(&emoji, kp.public_key()),
            Err(AsymmetricError::MessageTooLong { len: 256, .. })
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let alice = RsaKeyPair::generate().unwrap();
        let mallory = RsaKeyPair::generate().unwrap();
        let encrypted = encrypt_message("for alice", alice.public_key()).unwrap();

        assert!(matches!(
            decrypt_message(&encrypted, mallory.private_key()),
            Err(AsymmetricError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_non_deterministic() {
        let kp = RsaKeyPair::generate().unwrap();
        let a = encrypt_message("same", kp.public_key()).unwrap();
        let b = encrypt_message("same", kp.public_key()).unwrap();

        assert_ne!(a, b);
    }
}
