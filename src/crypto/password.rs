//! Login credential hashing (PBKDF2-SHA256, 10,000 iterations).
//!
//! Independent of message encryption. The persisted form is `salt:hash`, both
//! lowercase hex.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::kdf::{derive_key, PASSWORD_HASH_ITERATIONS, SALT_LEN};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Malformed credential: expected `salt:hash`")]
    Malformed,

    #[error("Invalid hex in credential: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Salt must be {expected} bytes, got {got}")]
    InvalidSaltLength { expected: usize, got: usize },
}

/// A hashed password as produced at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub hash: String,
    pub salt: String,
    /// `salt + ":" + hash`, the form that gets stored.
    pub combined: String,
}

impl Credential {
    /// Parses a stored `salt:hash` string.
    pub fn parse(combined: &str) -> Result<Self, PasswordError> {
        let (salt, hash) = combined.split_once(':').ok_or(PasswordError::Malformed)?;
        if salt.is_empty() || hash.is_empty() {
            return Err(PasswordError::Malformed);
        }
        Ok(Self {
            hash: hash.to_string(),
            salt: salt.to_string(),
            combined: combined.to_string(),
        })
    }
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Credential {
    hash_password_with_iterations(password, PASSWORD_HASH_ITERATIONS)
}

pub fn hash_password_with_iterations(password: &str, iterations: u32) -> Credential {
    let derived = derive_key(password, None, iterations);
    let salt = hex::encode(derived.salt());
    let hash = hex::encode(derived.key());
    let combined = format!("{}:{}", salt, hash);
    Credential { hash, salt, combined }
}

/// Checks `password` against a stored `salt:hash` string.
///
/// Returns `Ok(false)` for a wrong password and `Err` only for a malformed record.
pub fn verify_password(password: &str, combined: &str) -> Result<bool, PasswordError> {
    verify_password_with_iterations(password, combined, PASSWORD_HASH_ITERATIONS)
}

pub fn verify_password_with_iterations(
    password: &str,
    combined: &str,
    iterations: u32,
) -> Result<bool, PasswordError> {
    let credential = Credential::parse(combined)?;
    let salt_bytes = hex::decode(&credential.salt)?;
    let expected = hex::decode(&credential.hash)?;

    let salt: [u8; SALT_LEN] =
        salt_bytes
            .as_slice()
            .try_into()
            .map_err(|_| PasswordError::InvalidSaltLength {
                expected: SALT_LEN,
                got: salt_bytes.len(),
            })?;

    let derived = derive_key(password, Some(salt), iterations);
    Ok(derived.key().as_slice().ct_eq(expected.as_slice()).into())
}
