//! Double encryption ("2DE"): two AES-256-GCM layers under independent passwords.
//!
//! Layer order is fixed. `password1` seals the inner layer, `password2` the
//! outer one; opening removes the outer layer first. Supplying the passwords
//! in the wrong order fails authentication on the outer layer.

use super::symmetric::{
    open_layer, Algorithm, EncryptedEnvelope, SymmetricCipher, SymmetricError, DECRYPTION_FAILED,
};

/// Encrypts `plaintext` with `password1`, then the resulting base64 with `password2`.
pub fn encrypt2(
    cipher: &SymmetricCipher,
    plaintext: &str,
    password1: &str,
    password2: &str,
) -> Result<EncryptedEnvelope, SymmetricError> {
    let inner = cipher.seal_layer(plaintext, password1, Algorithm::Aes256Gcm)?;
    let outer = cipher.seal_layer(&inner.encrypted, password2, Algorithm::DoubleAes256Gcm)?;
    tracing::debug!(iterations = cipher.iterations(), "sealed double envelope");
    Ok(outer)
}

/// Removes the `password2` layer, then the `password1` layer.
pub fn decrypt2(
    envelope: &EncryptedEnvelope,
    password1: &str,
    password2: &str,
) -> Result<String, SymmetricError> {
    if envelope.algorithm != Algorithm::DoubleAes256Gcm {
        return Err(SymmetricError::UnexpectedAlgorithm {
            expected: Algorithm::DoubleAes256Gcm,
            got: envelope.algorithm,
        });
    }

    let inner = open_layer(&envelope.encrypted, password2, envelope.iterations)?;
    open_layer(&inner, password1, envelope.iterations)
}

/// Legacy variant of [`decrypt2`] that returns [`DECRYPTION_FAILED`] on any failure.
///
/// A failed outer layer short-circuits: the inner layer is never attempted.
pub fn decrypt2_lossy(envelope: &EncryptedEnvelope, password1: &str, password2: &str) -> String {
    match decrypt2(envelope, password1, password2) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            tracing::debug!(error = %e, "double decryption failed");
            DECRYPTION_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> SymmetricCipher {
        SymmetricCipher::with_iterations(1_000)
    }

    #[test]
    fn test_double_roundtrip() {
        let envelope = encrypt2(&cipher(), "two locks", "k1", "k2").unwrap();

        assert_eq!(envelope.algorithm, Algorithm::DoubleAes256Gcm);
        assert_eq!(decrypt2(&envelope, "k1", "k2").unwrap(), "two locks");
    }

    #[test]
    fn test_wrong_order_fails() {
        let envelope = encrypt2(&cipher(), "two locks", "k1", "k2").unwrap();
        let result = decrypt2(&envelope, "k2", "k1");

        assert!(matches!(result, Err(SymmetricError::DecryptionFailed)));
    }

    #[test]
    fn test_out_of_range_iterations_rejected() {
        let mut envelope = encrypt2(&cipher(), "two locks", "k1", "k2").unwrap();
        envelope.iterations = u32::MAX;

        assert!(matches!(
            decrypt2(&envelope, "k1", "k2"),
            Err(SymmetricError::InvalidIterations(_))
        ));
    }

    #[test]
    fn test_outer_layer_is_password2() {
        let envelope = encrypt2(&cipher(), "inner", "k1", "k2").unwrap();
        let inner = open_layer(&envelope.encrypted, "k2", envelope.iterations).unwrap();
        let plain = open_layer(&inner, "k1", envelope.iterations).unwrap();

        assert_eq!(plain, "inner");
    }

    #[test]
    fn test_single_layer_envelope_rejected() {
        let single = cipher().encrypt("x", "k1").unwrap();
        assert!(matches!(
            decrypt2(&single, "k1", "k2"),
            Err(SymmetricError::UnexpectedAlgorithm { .. })
        ));

        let double = encrypt2(&cipher(), "x", "k1", "k2").unwrap();
        assert!(cipher().decrypt(&double, "k2").is_err());
    }

    #[test]
    fn test_lossy_short_circuits() {
        let envelope = encrypt2(&cipher(), "x", "k1", "k2").unwrap();
        assert_eq!(decrypt2_lossy(&envelope, "k1", "bad"), DECRYPTION_FAILED);
        assert_eq!(decrypt2_lossy(&envelope, "bad", "k2"), DECRYPTION_FAILED);
        assert_eq!(decrypt2_lossy(&envelope, "k1", "k2"), "x");
    }
}
