//! Runtime configuration.
//!
//! Only values that do not change a stored format live here. Envelopes record
//! their own iteration count, so changing `symmetric_iterations` never strands
//! old ciphertexts. Private-key wrapping, RSA size and stego framing are fixed
//! constants in their modules.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::crypto::kdf::{AES_KEY_ITERATIONS, PASSWORD_HASH_ITERATIONS};
use crate::crypto::symmetric::MAX_ENVELOPE_ITERATIONS;
use crate::crypto::SymmetricCipher;

/// Default key vault file.
pub const DEFAULT_VAULT_PATH: &str = "fogwhisper-keys.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the crypto core and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iterations for new message envelopes.
    pub symmetric_iterations: u32,

    /// PBKDF2 iterations for login credential hashing.
    pub password_hash_iterations: u32,

    /// Permit the SHA-256-of-public-key fallback when RSA is unavailable.
    pub allow_insecure_fallback: bool,

    /// Where per-user key records are kept.
    pub vault_path: PathBuf,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            symmetric_iterations: AES_KEY_ITERATIONS,
            password_hash_iterations: PASSWORD_HASH_ITERATIONS,
            allow_insecure_fallback: false,
            vault_path: PathBuf::from(DEFAULT_VAULT_PATH),
        }
    }
}

impl CryptoConfig {
    /// Loads and validates a JSON config file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ENVELOPE_ITERATIONS).contains(&self.symmetric_iterations) {
            return Err(ConfigError::Invalid(format!(
                "symmetric_iterations must be in 1..={}",
                MAX_ENVELOPE_ITERATIONS
            )));
        }
        if self.password_hash_iterations == 0 {
            return Err(ConfigError::Invalid("password_hash_iterations must be > 0".into()));
        }
        Ok(())
    }

    /// The symmetric cipher new envelopes should be sealed with.
    pub fn cipher(&self) -> SymmetricCipher {
        SymmetricCipher::with_iterations(self.symmetric_iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = CryptoConfig::default();
        assert_eq!(config.symmetric_iterations, 600_000);
        assert_eq!(config.password_hash_iterations, 10_000);
        assert!(!config.allow_insecure_fallback);
        assert_eq!(config.cipher().iterations(), 600_000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "symmetric_iterations": 1000 }"#).unwrap();

        let config = CryptoConfig::load(&path).unwrap();
        assert_eq!(config.symmetric_iterations, 1_000);
        assert_eq!(config.password_hash_iterations, 10_000);
        assert_eq!(config.vault_path, PathBuf::from(DEFAULT_VAULT_PATH));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "symmetric_iterations": 0 }"#).unwrap();

        assert!(matches!(CryptoConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_iterations_rejected() {
        let config = CryptoConfig {
            symmetric_iterations: MAX_ENVELOPE_ITERATIONS + 1,
            ..CryptoConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(CryptoConfig::load(&path), Err(ConfigError::JsonError(_))));
    }
}
