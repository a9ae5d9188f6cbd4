//! Cryptographic operations for fogwhisper.
//!
//! This module provides:
//! - PBKDF2-SHA256 key derivation ([`kdf`])
//! - Password-based AES-256-GCM envelopes ([`symmetric`])
//! - Two-password double encryption, "2DE" ([`double`])
//! - RSA-OAEP key pairs, export and import ([`keys`]) and message encryption ([`asymmetric`])
//! - The weak legacy XOR layer ([`xor`]) and the insecure shared-key fallback ([`legacy`])
//! - Login credential hashing ([`password`])
//! - A startup capability probe ([`capability`])

pub mod asymmetric;
pub mod capability;
pub mod double;
pub mod kdf;
pub mod keys;
pub mod legacy;
pub mod password;
pub mod symmetric;
pub mod xor;

pub use asymmetric::{decrypt_message, encrypt_message, max_message_len, AsymmetricError};
pub use capability::CryptoCapability;
pub use double::{decrypt2, decrypt2_lossy, encrypt2};
pub use kdf::{derive_key, DerivedKey};
pub use keys::{
    export_private_key, export_public_key, import_private_key, import_public_key, load_private_key,
    load_public_key, KeyError, RsaKeyPair,
};
pub use legacy::InsecureSharedKeyCipher;
pub use password::{hash_password, verify_password, Credential, PasswordError};
pub use symmetric::{Algorithm, EncryptedEnvelope, SymmetricCipher, SymmetricError};
pub use xor::{LegacyXorCipher, XorError};
