//! Password-based symmetric encryption for fogwhisper.
//!
//! This module provides:
//! - PBKDF2-SHA256 key derivation with a fresh salt per message
//! - AES-256-GCM authenticated encryption with a fresh 12-byte IV per message
//! - The [`EncryptedEnvelope`] JSON wire format shared by the message store,
//!   chain storage and steganography payloads
//!
//! Blob layout (before base64): `salt (16) || iv (12) || ciphertext + tag (16)`

use std::time::{SystemTime, UNIX_EPOCH};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::kdf::{derive_key, AES_KEY_ITERATIONS, KEY_LEN, SALT_LEN};

/// IV size for AES-GCM.
pub const IV_LEN: usize = 12;

/// Authentication tag size for AES-GCM.
pub const TAG_LEN: usize = 16;

/// Literal shown by legacy call sites when a symmetric layer cannot be removed.
pub const DECRYPTION_FAILED: &str = "[Decryption Failed]";

/// Highest PBKDF2 count accepted from an envelope.
pub const MAX_ENVELOPE_ITERATIONS: u32 = AES_KEY_ITERATIONS * 4;

/// Errors that can occur during symmetric encryption.
#[derive(Error, Debug)]
pub enum SymmetricError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag mismatch: wrong password or tampered data.
    #[error("Decryption failed: wrong password or corrupted data")]
    DecryptionFailed,

    #[error("Invalid ciphertext: too short ({0} bytes)")]
    CiphertextTooShort(usize),

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Invalid envelope JSON: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),

    #[error("Decrypted data is not valid UTF-8")]
    InvalidUtf8,

    #[error("Iteration count {0} outside 1..={max}", max = MAX_ENVELOPE_ITERATIONS)]
    InvalidIterations(u32),

    #[error("Expected a {expected} envelope, got {got}")]
    UnexpectedAlgorithm { expected: Algorithm, got: Algorithm },
}

impl SymmetricError {
    /// True for parse failures, false for authentication failures.
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            SymmetricError::DecryptionFailed | SymmetricError::EncryptionFailed(_)
        )
    }
}

/// Algorithm tag carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "AES-256-GCM")]
    Aes256Gcm,
    /// Two AES-256-GCM layers under independent passwords.
    #[serde(rename = "2DE-AES-256-GCM")]
    DoubleAes256Gcm,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Aes256Gcm => f.write_str("AES-256-GCM"),
            Algorithm::DoubleAes256Gcm => f.write_str("2DE-AES-256-GCM"),
        }
    }
}

/// Result of a password encryption, as stored and transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// base64(`salt || iv || ciphertext+tag`)
    pub encrypted: String,
    pub algorithm: Algorithm,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// PBKDF2 iterations used for every layer of this envelope.
    pub iterations: u32,
}

impl EncryptedEnvelope {
    /// Serializes the envelope to its JSON wire form.
    pub fn to_json(&self) -> Result<String, SymmetricError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an envelope from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, SymmetricError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Current time in epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Encrypts raw bytes under a password.
///
/// Output format: salt (16 bytes) || iv (12 bytes) || ciphertext (includes tag)
pub fn seal_bytes(
    plaintext: &[u8],
    password: &str,
    iterations: u32,
) -> Result<Vec<u8>, SymmetricError> {
    let derived = derive_key(password, None, iterations);
    let sealed = seal_bytes_with_key(plaintext, derived.key())?;

    let mut result = Vec::with_capacity(SALT_LEN + sealed.len());
    result.extend_from_slice(derived.salt());
    result.extend_from_slice(&sealed);
    Ok(result)
}

/// Decrypts bytes produced by [`seal_bytes`].
pub fn open_bytes(data: &[u8], password: &str, iterations: u32) -> Result<Vec<u8>, SymmetricError> {
    if data.len() < SALT_LEN + IV_LEN + TAG_LEN {
        return Err(SymmetricError::CiphertextTooShort(data.len()));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&data[..SALT_LEN]);

    let derived = derive_key(password, Some(salt), iterations);
    open_bytes_with_key(&data[SALT_LEN..], derived.key())
}

/// AES-256-GCM under a raw key. Output format: iv (12 bytes) || ciphertext
pub(crate) fn seal_bytes_with_key(
    plaintext: &[u8],
    key: &[u8; KEY_LEN],
) -> Result<Vec<u8>, SymmetricError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| SymmetricError::EncryptionFailed(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|e| SymmetricError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(IV_LEN + ciphertext.len());
    result.extend_from_slice(&iv);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Reverses [`seal_bytes_with_key`].
pub(crate) fn open_bytes_with_key(data: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>, SymmetricError> {
    if data.len() < IV_LEN + TAG_LEN {
        return Err(SymmetricError::CiphertextTooShort(data.len()));
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| SymmetricError::DecryptionFailed)?;
    cipher
        .decrypt(Nonce::from_slice(&data[..IV_LEN]), &data[IV_LEN..])
        .map_err(|_| SymmetricError::DecryptionFailed)
}

/// AES-256-GCM text cipher keyed by a password.
///
/// Encrypting the same text twice never yields the same envelope: salt and IV
/// are drawn fresh for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricCipher {
    iterations: u32,
}

impl Default for SymmetricCipher {
    fn default() -> Self {
        Self {
            iterations: AES_KEY_ITERATIONS,
        }
    }
}

impl SymmetricCipher {
    /// Creates a cipher using the standard 600,000 iterations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cipher with a custom iteration count for new envelopes.
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Returns the iteration count used for new envelopes.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Encrypts UTF-8 text into an `AES-256-GCM` envelope.
    pub fn encrypt(&self, plaintext: &str, password: &str) -> Result<EncryptedEnvelope, SymmetricError> {
        let envelope = self.seal_layer(plaintext, password, Algorithm::Aes256Gcm)?;
        tracing::debug!(
            bytes = plaintext.len(),
            iterations = self.iterations,
            "encrypted symmetric envelope"
        );
        Ok(envelope)
    }

    /// Decrypts an `AES-256-GCM` envelope.
    ///
    /// The iteration count recorded in the envelope is used, not the cipher's.
    pub fn decrypt(&self, envelope: &EncryptedEnvelope, password: &str) -> Result<String, SymmetricError> {
        if envelope.algorithm != Algorithm::Aes256Gcm {
            return Err(SymmetricError::UnexpectedAlgorithm {
                expected: Algorithm::Aes256Gcm,
                got: envelope.algorithm,
            });
        }
        open_layer(&envelope.encrypted, password, envelope.iterations)
    }

    /// Like [`decrypt`](Self::decrypt) but renders failure as [`DECRYPTION_FAILED`].
    pub fn decrypt_lossy(&self, envelope: &EncryptedEnvelope, password: &str) -> String {
        self.decrypt(envelope, password).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "symmetric decryption failed");
            DECRYPTION_FAILED.to_string()
        })
    }

    pub(crate) fn seal_layer(
        &self,
        plaintext: &str,
        password: &str,
        algorithm: Algorithm,
    ) -> Result<EncryptedEnvelope, SymmetricError> {
        let sealed = seal_bytes(plaintext.as_bytes(), password, self.iterations)?;
        Ok(EncryptedEnvelope {
            encrypted: BASE64.encode(sealed),
            algorithm,
            timestamp: now_millis(),
            iterations: self.iterations,
        })
    }
}

/// Removes one base64 AES-GCM layer and returns the inner text.
///
/// `iterations` comes from the envelope, so it is bounded before any key is derived.
pub(crate) fn open_layer(encoded: &str, password: &str, iterations: u32) -> Result<String, SymmetricError> {
    if !(1..=MAX_ENVELOPE_ITERATIONS).contains(&iterations) {
        return Err(SymmetricError::InvalidIterations(iterations));
    }
    let data = BASE64.decode(encoded)?;
    let plaintext = open_bytes(&data, password, iterations)?;
    String::from_utf8(plaintext).map_err(|_| SymmetricError::InvalidUtf8)
}
