//! Startup probe for the primitives the asymmetric path depends on.
//!
//! Callers pick their encryption strategy from the probe result up front
//! instead of discovering a missing primitive halfway through a message.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

const SELF_TEST_PLAINTEXT: &[u8] = b"fogwhisper capability probe";

/// Whether native cryptography is usable on this platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoCapability {
    Supported,
    Unsupported { reason: String },
}

impl CryptoCapability {
    /// Runs an OS RNG draw and an AES-256-GCM encrypt/decrypt self-test.
    pub fn detect() -> Self {
        match self_test() {
            Ok(()) => {
                tracing::debug!("crypto capability probe passed");
                CryptoCapability::Supported
            }
            Err(reason) => {
                tracing::warn!(%reason, "crypto capability probe failed");
                CryptoCapability::Unsupported { reason }
            }
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, CryptoCapability::Supported)
    }
}

fn self_test() -> Result<(), String> {
    let mut key = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| format!("OS random source unavailable: {}", e))?;
    let mut iv = [0u8; 12];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| format!("OS random source unavailable: {}", e))?;

    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| e.to_string())?;
    let sealed = cipher
        .encrypt(Nonce::from_slice(&iv), SELF_TEST_PLAINTEXT)
        .map_err(|e| format!("AES-GCM encrypt failed: {}", e))?;
    let opened = cipher
        .decrypt(Nonce::from_slice(&iv), sealed.as_slice())
        .map_err(|e| format!("AES-GCM decrypt failed: {}", e))?;

    if opened != SELF_TEST_PLAINTEXT {
        return Err("AES-GCM self-test mismatch".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_supported() {
        let capability = CryptoCapability::detect();
        assert_eq!(capability, CryptoCapability::Supported);
        assert!(capability.is_supported());
    }

    #[test]
    fn test_unsupported_is_not_supported() {
        let capability = CryptoCapability::Unsupported {
            reason: "no rng".to_string(),
        };
        assert!(!capability.is_supported());
    }
}
