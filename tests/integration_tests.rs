//! Integration tests for fogwhisper
//!
//! Iteration counts are lowered through `SymmetricCipher::with_iterations`;
//! envelopes record their own count, so decryption still uses the right one.

use fogwhisper::crypto::{
    decrypt2, encrypt2, hash_password, import_public_key, verify_password, Algorithm,
    EncryptedEnvelope, LegacyXorCipher, RsaKeyPair, SymmetricCipher, SymmetricError,
};
use fogwhisper::{
    failure_indicator, ErrorKind, FileKeyVault, ImageStego, KeyPairManager, KeyPairState,
    MemoryKeyVault, MessageSealer, MessageType, OpenKeys, SealOptions, SealedMessage, StegoCodec,
    StegoError, TransportMessage,
};
use fogwhisper::CryptoCapability;
use image::{DynamicImage, Rgba, RgbaImage};
use tempfile::tempdir;

fn fast_cipher() -> SymmetricCipher {
    SymmetricCipher::with_iterations(1_000)
}

fn sealer() -> MessageSealer {
    MessageSealer::new(fast_cipher(), CryptoCapability::Supported, false)
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

/// Envelope JSON survives a trip through an external store
#[test]
fn test_envelope_json_through_store() {
    let envelope = fast_cipher().encrypt("stored text", "pw").unwrap();
    let json = envelope.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["algorithm"], "AES-256-GCM");
    assert!(value["timestamp"].as_i64().unwrap() > 0);

    let restored = EncryptedEnvelope::from_json(&json).unwrap();
    assert_eq!(fast_cipher().decrypt(&restored, "pw").unwrap(), "stored text");
    assert!(fast_cipher().decrypt(&restored, "other").is_err());
}

/// Double encryption needs both passwords in the original order
#[test]
fn test_double_encryption_order() {
    let envelope = encrypt2(&fast_cipher(), "two locks", "first", "second").unwrap();
    assert_eq!(envelope.algorithm, Algorithm::DoubleAes256Gcm);

    assert_eq!(decrypt2(&envelope, "first", "second").unwrap(), "two locks");
    assert!(decrypt2(&envelope, "second", "first").is_err());
    assert!(decrypt2(&envelope, "first", "wrong").is_err());
}

/// Alice seals to Bob's vault public key, Bob opens after logging in
#[test]
fn test_vault_login_and_rsa_exchange() {
    let dir = tempdir().unwrap();
    let vault_path = dir.path().join("keys.json");

    let bob_public = {
        let manager = KeyPairManager::new(FileKeyVault::new(&vault_path));
        manager.login("bob", "bob-pw").unwrap();
        manager.public_key_of("bob").unwrap().unwrap()
    };

    let recipient = import_public_key(&bob_public).unwrap();
    let sealed = sealer()
        .seal(
            "hello bob",
            &SealOptions {
                recipient: Some(&recipient),
                ..Default::default()
            },
        )
        .unwrap();
    let transport = TransportMessage::new("alice", Some("bob".into()), sealed, MessageType::Permanent);
    let wire = serde_json::to_string(&transport).unwrap();

    // New process: nothing cached until Bob logs in again.
    let manager = KeyPairManager::new(FileKeyVault::new(&vault_path));
    assert_eq!(manager.state("bob").unwrap(), KeyPairState::AtRest);
    assert!(manager.key_pair("bob").is_err());

    let received: TransportMessage = serde_json::from_str(&wire).unwrap();
    assert!(received.flags.rsa_encrypted);

    let no_keys = OpenKeys::default();
    assert_eq!(
        sealer().open_for_display(&received.content, &no_keys),
        "🔒 [RSA Encrypted - Decryption failed]"
    );

    let bob = manager.login("bob", "bob-pw").unwrap();
    let keys = OpenKeys {
        private_key: Some(bob.private_key()),
        ..Default::default()
    };
    assert_eq!(sealer().open(&received.content, &keys).unwrap(), "hello bob");

    manager.logout("bob");
    assert_eq!(manager.state("bob").unwrap(), KeyPairState::AtRest);
}

/// A wrong vault password never yields a usable key
#[test]
fn test_vault_wrong_password() {
    let manager = KeyPairManager::new(MemoryKeyVault::new());
    manager.login("carol", "right").unwrap();
    manager.logout("carol");

    let err = fogwhisper::Error::from(manager.login("carol", "wrong").unwrap_err());
    assert_eq!(err.kind(), ErrorKind::Decryption);
}

/// A message from another sender's key shows the RSA placeholder
#[test]
fn test_rsa_wrong_private_key() {
    let bob = RsaKeyPair::generate().unwrap();
    let eve = RsaKeyPair::generate().unwrap();
    let sealed = sealer()
        .seal(
            "for bob only",
            &SealOptions {
                recipient: Some(bob.public_key()),
                ..Default::default()
            },
        )
        .unwrap();

    let keys = OpenKeys {
        private_key: Some(eve.private_key()),
        ..Default::default()
    };
    let err = sealer().open(&sealed, &keys).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyMismatch);
    assert_eq!(failure_indicator(&err), "🔒 [RSA Encrypted - Decryption failed]");
}

/// Sealed messages keep their variant across JSON
#[test]
fn test_sealed_message_variants_roundtrip_json() {
    let double = sealer()
        .seal(
            "stacked",
            &SealOptions {
                password: Some("a"),
                second_password: Some("b"),
                ..Default::default()
            },
        )
        .unwrap();

    let json = serde_json::to_string(&double).unwrap();
    let back: SealedMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, double);

    let keys = OpenKeys {
        password: Some("a"),
        second_password: Some("b"),
        ..Default::default()
    };
    assert_eq!(sealer().open(&back, &keys).unwrap(), "stacked");

    let missing = OpenKeys {
        password: Some("a"),
        ..Default::default()
    };
    assert_eq!(sealer().open_for_display(&back, &missing), "[Decryption Failed]");
}

/// Legacy XOR data still decodes with the key it was made with
#[test]
fn test_legacy_xor_layer() {
    let cipher = LegacyXorCipher::new("legacy-key").unwrap();
    let encoded = cipher.encrypt("old message").unwrap();

    assert_eq!(cipher.decrypt(&encoded).unwrap(), "old message");
    assert!(LegacyXorCipher::new("").is_err());
}

/// Hide in a PNG, write it to disk, read it back and reveal
#[test]
fn test_stego_png_file_roundtrip() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("carrier.png");

    let codec = StegoCodec::new(fast_cipher());
    let carrier = ImageStego::from_image(DynamicImage::ImageRgba8(gradient(200, 200)));
    carrier
        .hide(&codec, "the eagle lands at dawn", "pw")
        .unwrap()
        .save(&out)
        .unwrap();

    let loaded = ImageStego::from_file(&out).unwrap();
    assert_eq!(loaded.reveal(&codec, "pw").unwrap(), "the eagle lands at dawn");
    let err = loaded.reveal(&codec, "other").unwrap_err();
    assert!(
        matches!(
            err,
            StegoError::NoHiddenMessage
                | StegoError::UnsupportedVersion(_)
                | StegoError::InvalidHeader(_)
                | StegoError::InvalidPayload(_)
                | StegoError::Symmetric(SymmetricError::DecryptionFailed)
        ),
        "unexpected error: {err:?}"
    );
}

/// Oversized payloads fail before any pixel changes
#[test]
fn test_stego_capacity_leaves_image_untouched() {
    let codec = StegoCodec::new(fast_cipher());
    let mut image = gradient(10, 10);
    let before = image.clone();

    let result = codec.embed(&mut image, &"z".repeat(1_000), "pw");
    assert!(matches!(result, Err(StegoError::ImageTooSmall { .. })));
    assert_eq!(image, before);
}

/// A clean image has no hidden message
#[test]
fn test_stego_clean_image() {
    let codec = StegoCodec::new(fast_cipher());
    let stego = ImageStego::from_image(DynamicImage::ImageRgba8(gradient(64, 64)));
    let err = fogwhisper::Error::from(stego.reveal(&codec, "pw").unwrap_err());
    assert_eq!(err.kind(), ErrorKind::Format);
}

/// Login credentials verify only with the same password
#[test]
fn test_password_hashing() {
    let credential = hash_password("hunter2");
    assert!(verify_password("hunter2", &credential.combined).unwrap());
    assert!(!verify_password("hunter3", &credential.combined).unwrap());
    assert!(verify_password("hunter2", "not-a-credential").is_err());
}

/// Key files written by one process load in another
#[test]
fn test_key_files_roundtrip() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("alice");

    let alice = RsaKeyPair::generate().unwrap();
    alice.save_to_files(&base, "file-pw").unwrap();

    let loaded = RsaKeyPair::load_from_files(&base, "file-pw").unwrap();
    assert_eq!(loaded.public_key(), alice.public_key());
    assert!(RsaKeyPair::load_from_files(&base, "wrong").is_err());
}
