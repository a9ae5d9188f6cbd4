//! # fogwhisper - layered message encryption
//!
//! The cryptographic core of a secure-messaging client: password envelopes,
//! two-password double encryption, RSA-OAEP key pairs with an encrypted-at-rest
//! private key, a legacy XOR layer kept for old messages, login password
//! hashing, and chaotic-permutation LSB image steganography.
//!
//! ## Overview
//!
//! - Every symmetric key comes from PBKDF2-HMAC-SHA256 with a per-message salt
//! - Symmetric messages travel as a JSON [`EncryptedEnvelope`] whose `encrypted`
//!   field is `base64(salt || iv || ciphertext+tag)`
//! - Double encryption seals the inner envelope's blob again under a second password
//! - RSA private keys are stored only in password-encrypted form; unlocked keys
//!   live in a per-session cache owned by a [`KeyPairManager`]
//! - Stego hides an encrypted envelope in pixel LSBs visited in a
//!   password-seeded chaotic order
//!
//! ## Example Usage
//!
//! ```rust
//! use fogwhisper::crypto::{decrypt2, encrypt2, SymmetricCipher};
//!
//! let cipher = SymmetricCipher::with_iterations(10_000);
//! let envelope = encrypt2(&cipher, "meet at noon", "inner", "outer").unwrap();
//!
//! // Passwords must be given in the same order
//! assert_eq!(decrypt2(&envelope, "inner", "outer").unwrap(), "meet at noon");
//! assert!(decrypt2(&envelope, "outer", "inner").is_err());
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: primitives (KDF, AES-GCM, RSA-OAEP, XOR, password hashing)
//! - [`stego`]: image steganography
//! - [`message`]: layer selection and the transport record
//! - [`session`] / [`vault`]: key pair lifecycle and at-rest storage
//! - [`config`] / [`error`]: runtime configuration and the crate-wide error type

pub mod config;
pub mod crypto;
pub mod error;
pub mod message;
pub mod session;
pub mod stego;
pub mod vault;

// Re-export commonly used types at the crate root
pub use config::{ConfigError, CryptoConfig};
pub use crypto::{
    CryptoCapability, EncryptedEnvelope, LegacyXorCipher, RsaKeyPair, SymmetricCipher,
};
pub use error::{failure_indicator, Error, ErrorKind, Result};
pub use message::{
    LayerFlags, MessageSealer, MessageType, OpenKeys, SealOptions, SealedMessage, TransportMessage,
};
pub use session::{KeyPairManager, KeyPairState, LoginStage, SessionError, SessionKeyCache};
pub use stego::{ImageStego, StegoCodec, StegoError};
pub use vault::{FileKeyVault, KeyVault, MemoryKeyVault, StoredKeyRecord, VaultError};
