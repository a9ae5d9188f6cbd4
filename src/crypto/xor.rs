//! Legacy keyed XOR "manual encryption" layer.
//!
//! **Not encryption in any cryptographic sense.** It is a reversible obfuscation
//! layer that older clients stack on top of RSA ciphertext, kept only so their
//! messages still open. It has no integrity check: a wrong key yields garbage,
//! not an error. [`LegacyXorCipher::decrypt_checked`] offers a printable-text
//! heuristic, which can report false positives and false negatives.
//!
//! Wire format: every UTF-16 code unit of the text is XORed with the key's
//! code unit at the same position (key repeated), and the resulting units are
//! base64-encoded as one byte each. A unit above 0xFF cannot be represented and
//! is rejected.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

/// Literal shown by legacy call sites when the XOR layer yields garbage.
pub const INVALID_KEY: &str = "[Invalid Key]";

#[derive(Error, Debug)]
pub enum XorError {
    #[error("XOR key must not be empty")]
    EmptyKey,

    #[error("Character at position {position} does not fit in one byte after XOR")]
    CharacterOutOfRange { position: usize },

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// Output is not valid text. Probably the wrong key.
    #[error("Output is not readable text (wrong key?)")]
    ProbableKeyMismatch,
}

/// The weak XOR layer, keyed by a user-supplied string.
#[derive(Clone)]
pub struct LegacyXorCipher {
    key: Vec<u16>,
}

impl std::fmt::Debug for LegacyXorCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyXorCipher").field("key", &"[REDACTED]").finish()
    }
}

impl LegacyXorCipher {
    pub fn new(key: &str) -> Result<Self, XorError> {
        let key: Vec<u16> = key.encode_utf16().collect();
        if key.is_empty() {
            return Err(XorError::EmptyKey);
        }
        Ok(Self { key })
    }

    fn apply(&self, units: impl Iterator<Item = u16>) -> Vec<u16> {
        units
            .zip(self.key.iter().cycle())
            .map(|(unit, k)| unit ^ k)
            .collect()
    }

    /// XORs `text` with the key and base64-encodes the result.
    pub fn encrypt(&self, text: &str) -> Result<String, XorError> {
        let bytes = self
            .apply(text.encode_utf16())
            .into_iter()
            .enumerate()
            .map(|(position, unit)| {
                u8::try_from(unit).map_err(|_| XorError::CharacterOutOfRange { position })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(BASE64.encode(bytes))
    }

    /// Reverses [`encrypt`](Self::encrypt). Never detects a wrong key.
    ///
    /// Unpaired surrogates produced by a wrong key are replaced with U+FFFD.
    pub fn decrypt(&self, encoded: &str) -> Result<String, XorError> {
        let bytes = BASE64.decode(encoded.trim())?;
        let units = self.apply(bytes.into_iter().map(u16::from));
        Ok(String::from_utf16_lossy(&units))
    }

    /// [`decrypt`](Self::decrypt) plus a readability heuristic.
    pub fn decrypt_checked(&self, encoded: &str) -> Result<String, XorError> {
        let text = self.decrypt(encoded)?;
        if looks_like_text(&text) {
            Ok(text)
        } else {
            Err(XorError::ProbableKeyMismatch)
        }
    }
}

/// Heuristic: no control characters other than common whitespace, no U+FFFD.
pub fn looks_like_text(text: &str) -> bool {
    text.chars()
        .all(|c| (!c.is_control() || matches!(c, '\n' | '\r' | '\t')) && c != '\u{FFFD}')
}
