//! Layered message sealing.
//!
//! Which layers protect a message is decided once, at seal time, and recorded
//! as a [`SealedMessage`] variant. Opening is a single exhaustive match; there
//! are no flag combinations to guess from. The legacy `rsaEncrypted` /
//! `manuallyEncrypted` / `doubleEncrypted` booleans are derived from the variant
//! for transport records that still carry them.

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::config::CryptoConfig;
use crate::crypto::asymmetric::{decrypt_message, encrypt_message};
use crate::crypto::capability::CryptoCapability;
use crate::crypto::double::{decrypt2, encrypt2};
use crate::crypto::keys::export_public_key;
use crate::crypto::legacy::InsecureSharedKeyCipher;
use crate::crypto::symmetric::{now_millis, EncryptedEnvelope, SymmetricCipher};
use crate::crypto::xor::LegacyXorCipher;
use crate::error::{failure_indicator, Error, Result};

/// A message body together with the layers that protect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SealedMessage {
    Plain { text: String },
    Symmetric { envelope: EncryptedEnvelope },
    /// Base64 RSA-OAEP ciphertext.
    Asymmetric { ciphertext: String },
    /// RSA-OAEP ciphertext, then the legacy XOR layer.
    AsymmetricThenXor { ciphertext: String },
    DoubleSymmetric { envelope: EncryptedEnvelope },
    /// Known-insecure fallback keyed by the recipient's public key.
    InsecureSharedKey { ciphertext: String },
}

/// Legacy per-message layer booleans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerFlags {
    pub rsa_encrypted: bool,
    pub manually_encrypted: bool,
    pub double_encrypted: bool,
}

impl SealedMessage {
    pub fn layer_flags(&self) -> LayerFlags {
        match self {
            SealedMessage::Plain { .. } | SealedMessage::Symmetric { .. } => LayerFlags::default(),
            SealedMessage::Asymmetric { .. } | SealedMessage::InsecureSharedKey { .. } => {
                LayerFlags {
                    rsa_encrypted: true,
                    ..LayerFlags::default()
                }
            }
            SealedMessage::AsymmetricThenXor { .. } => LayerFlags {
                rsa_encrypted: true,
                manually_encrypted: true,
                ..LayerFlags::default()
            },
            SealedMessage::DoubleSymmetric { .. } => LayerFlags {
                double_encrypted: true,
                ..LayerFlags::default()
            },
        }
    }
}

/// Keys and passwords available when sealing.
#[derive(Default, Clone, Copy)]
pub struct SealOptions<'a> {
    pub recipient: Option<&'a RsaPublicKey>,
    /// Extra key for the legacy XOR layer (only stacked on RSA).
    pub xor_key: Option<&'a str>,
    pub password: Option<&'a str>,
    /// Outer password for double encryption.
    pub second_password: Option<&'a str>,
}

/// Keys and passwords available when opening.
#[derive(Default, Clone, Copy)]
pub struct OpenKeys<'a> {
    pub private_key: Option<&'a RsaPrivateKey>,
    /// Own exported public key, only for the insecure fallback.
    pub public_key: Option<&'a str>,
    pub xor_key: Option<&'a str>,
    pub password: Option<&'a str>,
    pub second_password: Option<&'a str>,
}

/// Chooses and applies layers; probes platform capability once at construction.
#[derive(Debug, Clone)]
pub struct MessageSealer {
    cipher: SymmetricCipher,
    capability: CryptoCapability,
    allow_insecure_fallback: bool,
}

impl MessageSealer {
    pub fn new(cipher: SymmetricCipher, capability: CryptoCapability, allow_insecure_fallback: bool) -> Self {
        Self {
            cipher,
            capability,
            allow_insecure_fallback,
        }
    }

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self::new(
            config.cipher(),
            CryptoCapability::detect(),
            config.allow_insecure_fallback,
        )
    }

    pub fn capability(&self) -> &CryptoCapability {
        &self.capability
    }

    /// Seals `plaintext` with every layer the options make possible.
    ///
    /// A recipient key selects the RSA path (plus XOR if `xor_key` is set);
    /// otherwise one or two passwords select the symmetric paths; with nothing
    /// supplied the message goes out plain.
    pub fn seal(&self, plaintext: &str, options: &SealOptions<'_>) -> Result<SealedMessage> {
        let sealed = match (options.recipient, options.password, options.second_password) {
            (Some(recipient), _, _) => self.seal_for_recipient(plaintext, recipient, options.xor_key)?,
            (None, _, _) if options.xor_key.is_some() => {
                return Err(Error::UnsupportedLayers(
                    "the XOR layer is only applied on top of RSA".to_string(),
                ))
            }
            (None, Some(first), Some(second)) => SealedMessage::DoubleSymmetric {
                envelope: encrypt2(&self.cipher, plaintext, first, second)?,
            },
            (None, Some(password), None) => SealedMessage::Symmetric {
                envelope: self.cipher.encrypt(plaintext, password)?,
            },
            (None, None, Some(_)) => {
                return Err(Error::UnsupportedLayers(
                    "second password given without a first".to_string(),
                ))
            }
            (None, None, None) => SealedMessage::Plain {
                text: plaintext.to_string(),
            },
        };
        tracing::debug!(flags = ?sealed.layer_flags(), "sealed message");
        Ok(sealed)
    }

    fn seal_for_recipient(
        &self,
        plaintext: &str,
        recipient: &RsaPublicKey,
        xor_key: Option<&str>,
    ) -> Result<SealedMessage> {
        if let CryptoCapability::Unsupported { reason } = &self.capability {
            if !self.allow_insecure_fallback {
                return Err(Error::CapabilityUnavailable(reason.clone()));
            }
            let shared = InsecureSharedKeyCipher::new(&export_public_key(recipient)?);
            return Ok(SealedMessage::InsecureSharedKey {
                ciphertext: shared.encrypt(plaintext)?,
            });
        }

        let ciphertext = encrypt_message(plaintext, recipient)?;
        Ok(match xor_key {
            Some(key) => SealedMessage::AsymmetricThenXor {
                ciphertext: LegacyXorCipher::new(key)?.encrypt(&ciphertext)?,
            },
            None => SealedMessage::Asymmetric { ciphertext },
        })
    }

    /// Removes every layer recorded in `sealed`.
    pub fn open(&self, sealed: &SealedMessage, keys: &OpenKeys<'_>) -> Result<String> {
        match sealed {
            SealedMessage::Plain { text } => Ok(text.clone()),
            SealedMessage::Symmetric { envelope } => {
                let password = keys.password.ok_or(Error::MissingKey("password"))?;
                Ok(self.cipher.decrypt(envelope, password)?)
            }
            SealedMessage::Asymmetric { ciphertext } => {
                let private_key = keys.private_key.ok_or(Error::MissingKey("private key"))?;
                Ok(decrypt_message(ciphertext, private_key)?)
            }
            SealedMessage::AsymmetricThenXor { ciphertext } => {
                let private_key = keys.private_key.ok_or(Error::MissingKey("private key"))?;
                let xor_key = keys.xor_key.ok_or(Error::MissingKey("XOR key"))?;
                // A wrong XOR key leaves unparseable RSA input, which surfaces below.
                let inner = LegacyXorCipher::new(xor_key)?.decrypt(ciphertext)?;
                Ok(decrypt_message(&inner, private_key)?)
            }
            SealedMessage::DoubleSymmetric { envelope } => {
                let first = keys.password.ok_or(Error::MissingKey("password"))?;
                let second = keys
                    .second_password
                    .ok_or(Error::MissingKey("second password"))?;
                Ok(decrypt2(envelope, first, second)?)
            }
            SealedMessage::InsecureSharedKey { ciphertext } => {
                if !self.allow_insecure_fallback {
                    return Err(Error::UnsupportedLayers(
                        "insecure shared-key messages are disabled".to_string(),
                    ));
                }
                let public_key = keys.public_key.ok_or(Error::MissingKey("public key"))?;
                Ok(InsecureSharedKeyCipher::new(public_key).decrypt(ciphertext)?)
            }
        }
    }

    /// [`open`](Self::open) for display: failures become literal placeholders.
    pub fn open_for_display(&self, sealed: &SealedMessage, keys: &OpenKeys<'_>) -> String {
        self.open(sealed, keys).unwrap_or_else(|e| {
            tracing::debug!(error = %e, kind = ?e.kind(), "message could not be opened");
            failure_indicator(&e).to_string()
        })
    }
}

/// Lifetime policy of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Permanent,
    Temporary,
    SelfDestruct,
}

/// Message record handed to the external message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportMessage {
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub content: SealedMessage,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(flatten)]
    pub flags: LayerFlags,
    pub timestamp: i64,
}

impl TransportMessage {
    pub fn new(
        sender: impl Into<String>,
        receiver: Option<String>,
        content: SealedMessage,
        message_type: MessageType,
    ) -> Self {
        let flags = content.layer_flags();
        Self {
            sender: sender.into(),
            receiver,
            content,
            message_type,
            flags,
            timestamp: now_millis(),
        }
    }
}
