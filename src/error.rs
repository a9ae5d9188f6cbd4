//! Crate-level error and failure taxonomy.
//!
//! Every module keeps its own error enum; [`Error`] wraps them so callers that
//! stack several layers can use one `Result`. [`Error::kind`] sorts any failure
//! into the categories UIs care about, and [`failure_indicator`] renders the
//! literal strings legacy screens expect.

use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::asymmetric::{AsymmetricError, RSA_DECRYPTION_FAILED};
use crate::crypto::keys::KeyError;
use crate::crypto::password::PasswordError;
use crate::crypto::symmetric::{SymmetricError, DECRYPTION_FAILED};
use crate::crypto::xor::{XorError, INVALID_KEY};
use crate::session::SessionError;
use crate::stego::StegoError;
use crate::vault::VaultError;

pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, independent of which layer noticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Authentication failed: wrong password or tampered data.
    Decryption,
    /// Malformed base64, JSON, header or key encoding.
    Format,
    /// Payload too large for an image or an RSA block. Nothing was written.
    Capacity,
    /// Wrong or missing key for an RSA/XOR layer.
    KeyMismatch,
    /// The platform cannot perform the requested operation.
    Unsupported,
    Io,
    Internal,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Symmetric(#[from] SymmetricError),

    #[error(transparent)]
    Asymmetric(#[from] AsymmetricError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Xor(#[from] XorError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Stego(#[from] StegoError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Missing {0} needed to open this message")]
    MissingKey(&'static str),

    #[error("Unsupported layer combination: {0}")]
    UnsupportedLayers(String),

    #[error("Native cryptography unavailable: {0}")]
    CapabilityUnavailable(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Symmetric(e) => symmetric_kind(e),
            Error::Asymmetric(e) => match e {
                AsymmetricError::MessageTooLong { .. } => ErrorKind::Capacity,
                AsymmetricError::DecryptionFailed | AsymmetricError::InvalidUtf8 => {
                    ErrorKind::KeyMismatch
                }
                AsymmetricError::InvalidBase64(_) => ErrorKind::Format,
                AsymmetricError::EncryptionFailed(_) => ErrorKind::Internal,
            },
            Error::Key(e) => key_kind(e),
            Error::Xor(e) => match e {
                XorError::ProbableKeyMismatch => ErrorKind::KeyMismatch,
                _ => ErrorKind::Format,
            },
            Error::Password(_) => ErrorKind::Format,
            Error::Stego(e) => match e {
                StegoError::ImageTooSmall { .. } | StegoError::PayloadTooLong(_) => {
                    ErrorKind::Capacity
                }
                StegoError::Symmetric(inner) => symmetric_kind(inner),
                StegoError::ImageLoadError(_)
                | StegoError::ImageSaveError(_)
                | StegoError::IoError(_) => ErrorKind::Io,
                _ => ErrorKind::Format,
            },
            Error::Session(e) => match e {
                SessionError::Key(inner) => key_kind(inner),
                SessionError::Vault(inner) => vault_kind(inner),
                SessionError::NotLoaded(_) | SessionError::MissingRecord(_) => ErrorKind::KeyMismatch,
                SessionError::TaskFailed(_) => ErrorKind::Internal,
            },
            Error::Vault(e) => vault_kind(e),
            Error::Config(e) => match e {
                ConfigError::IoError(_) => ErrorKind::Io,
                _ => ErrorKind::Format,
            },
            Error::MissingKey(_) => ErrorKind::KeyMismatch,
            Error::UnsupportedLayers(_) => ErrorKind::Format,
            Error::CapabilityUnavailable(_) => ErrorKind::Unsupported,
        }
    }
}

fn symmetric_kind(e: &SymmetricError) -> ErrorKind {
    match e {
        SymmetricError::DecryptionFailed => ErrorKind::Decryption,
        SymmetricError::EncryptionFailed(_) => ErrorKind::Internal,
        _ => ErrorKind::Format,
    }
}

fn key_kind(e: &KeyError) -> ErrorKind {
    match e {
        KeyError::WrongPasswordOrCorrupted => ErrorKind::Decryption,
        KeyError::GenerationFailed(_) | KeyError::EncodingFailed(_) => ErrorKind::Internal,
        KeyError::IoError(_) => ErrorKind::Io,
        _ => ErrorKind::Format,
    }
}

fn vault_kind(e: &VaultError) -> ErrorKind {
    match e {
        VaultError::IoError(_) => ErrorKind::Io,
        _ => ErrorKind::Format,
    }
}

/// Literal placeholder a legacy UI shows instead of the message text.
pub fn failure_indicator(err: &Error) -> &'static str {
    match err {
        Error::Asymmetric(_) | Error::Session(_) | Error::MissingKey("private key") => {
            RSA_DECRYPTION_FAILED
        }
        Error::Xor(_) => INVALID_KEY,
        _ => DECRYPTION_FAILED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            Error::from(SymmetricError::DecryptionFailed).kind(),
            ErrorKind::Decryption
        );
        assert_eq!(
            Error::from(SymmetricError::CiphertextTooShort(3)).kind(),
            ErrorKind::Format
        );
        assert_eq!(
            Error::from(AsymmetricError::MessageTooLong { len: 200, max: 190 }).kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            Error::from(StegoError::ImageTooSmall {
                needed_bits: 10,
                capacity_bits: 3
            })
            .kind(),
            ErrorKind::Capacity
        );
        assert_eq!(Error::from(StegoError::NoHiddenMessage).kind(), ErrorKind::Format);
        assert_eq!(
            Error::from(StegoError::Symmetric(SymmetricError::DecryptionFailed)).kind(),
            ErrorKind::Decryption
        );
        assert_eq!(
            Error::from(SessionError::NotLoaded("alice".into())).kind(),
            ErrorKind::KeyMismatch
        );
        assert_eq!(
            Error::from(KeyError::WrongPasswordOrCorrupted).kind(),
            ErrorKind::Decryption
        );
    }

    #[test]
    fn test_indicators() {
        assert_eq!(
            failure_indicator(&AsymmetricError::DecryptionFailed.into()),
            "🔒 [RSA Encrypted - Decryption failed]"
        );
        assert_eq!(failure_indicator(&XorError::ProbableKeyMismatch.into()), "[Invalid Key]");
        assert_eq!(
            failure_indicator(&SymmetricError::DecryptionFailed.into()),
            "[Decryption Failed]"
        );
    }
}
