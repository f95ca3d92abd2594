use std::sync::OnceLock;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use pgp_ops::{
    decrypt_and_verify, encrypt, sign, sign_and_encrypt, spawn_decrypt_and_verify, spawn_generate,
    spawn_sign_and_encrypt, verify, Error, KeyPair, KeyPairFactory, KeyPairParamsBuilder,
    PublicKey,
};

const PASSPHRASE: &str = "rimshot";

fn generate(seed: u64, user_id: &str) -> KeyPair {
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let params = KeyPairParamsBuilder::default()
        .num_bits(2048)
        .primary_user_id(user_id.into())
        .passphrase(Some(PASSPHRASE.into()))
        .unlocked(true)
        .build()
        .unwrap();
    KeyPairFactory::new().generate(rng, params).unwrap()
}

fn alice() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate(1, "Alice <alice@example.org>"))
}

fn bob() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate(2, "Bob <bob@example.org>"))
}

#[test]
fn test_sign_and_encrypt_round_trip() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(10);

    let armored =
        sign_and_encrypt(rng, &bob().public_key, &alice().secret_key, "hello bob").unwrap();
    assert!(armored.starts_with("-----BEGIN PGP MESSAGE-----"));

    let received = decrypt_and_verify(&bob().secret_key, &alice().public_key, &armored)
        .unwrap()
        .expect("should contain literal data");
    assert_eq!(received.text, "hello bob");
    assert_eq!(received.signatures.len(), 1);
    assert_eq!(
        received.signatures[0].key_id,
        alice().secret_key.key_id_hex()
    );
    assert!(received.signatures[0].valid);
}

#[test]
fn test_multi_recipient_encryption() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(11);

    let recipients = vec![&alice().public_key, &bob().public_key];
    let armored = sign_and_encrypt(rng, recipients, &alice().secret_key, "group update").unwrap();

    // every listed recipient can open the same armored message
    for pair in [alice(), bob()] {
        let received = decrypt_and_verify(&pair.secret_key, &alice().public_key, &armored)
            .unwrap()
            .expect("should contain literal data");
        assert_eq!(received.text, "group update");
        assert!(received.signatures[0].valid);
    }
}

#[test]
fn test_empty_plaintext_round_trips() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(12);

    let armored = sign_and_encrypt(rng, &bob().public_key, &alice().secret_key, "").unwrap();
    let received = decrypt_and_verify(&bob().secret_key, &alice().public_key, &armored)
        .unwrap()
        .expect("empty text is still literal data");
    assert_eq!(received.text, "");
    assert_eq!(received.signatures.len(), 1);
    assert!(received.signatures[0].valid);
}

#[test]
fn test_signature_from_outside_ring_reported_invalid() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(13);

    let armored =
        sign_and_encrypt(rng, &bob().public_key, &alice().secret_key, "who signed this").unwrap();

    // bob verifies against his own key instead of alice's
    let received = decrypt_and_verify(&bob().secret_key, &bob().public_key, &armored)
        .unwrap()
        .expect("should contain literal data");
    assert_eq!(received.text, "who signed this");
    assert_eq!(received.signatures.len(), 1);
    assert_eq!(
        received.signatures[0].key_id,
        alice().secret_key.key_id_hex()
    );
    assert!(!received.signatures[0].valid);
}

#[test]
fn test_tampered_message_fails() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(14);

    let armored =
        sign_and_encrypt(rng, &bob().public_key, &alice().secret_key, "untouched").unwrap();

    // flip one character in the middle of the armored body
    let mid = armored.len() / 2;
    let mut bytes = armored.into_bytes();
    bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let result = decrypt_and_verify(&bob().secret_key, &alice().public_key, &tampered);
    assert!(result.is_err());
}

#[test]
fn test_locked_signer_cannot_sign() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(15);

    let mut secret = alice().secret_key.clone();
    secret.lock().unwrap();

    let err = sign_and_encrypt(rng, &bob().public_key, &secret, "nope").unwrap_err();
    assert!(matches!(err, Error::KeyLocked));
}

#[test]
fn test_locked_recipient_cannot_decrypt() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(16);

    let armored = sign_and_encrypt(rng, &bob().public_key, &alice().secret_key, "later").unwrap();

    let mut secret = bob().secret_key.clone();
    secret.lock().unwrap();

    let err = decrypt_and_verify(&secret, &alice().public_key, &armored).unwrap_err();
    assert!(matches!(err, Error::KeyLocked));
}

#[test]
fn test_decrypt_with_wrong_key_fails() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(17);

    let armored =
        sign_and_encrypt(rng, &alice().public_key, &alice().secret_key, "for alice only").unwrap();

    let err = decrypt_and_verify(&bob().secret_key, &alice().public_key, &armored).unwrap_err();
    assert!(matches!(err, Error::NoMatchingRecipientKey));
}

#[test]
fn test_standalone_sign_and_verify() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(18);

    let armored = sign(rng, &alice().secret_key, "signed in the clear").unwrap();
    assert!(armored.starts_with("-----BEGIN PGP MESSAGE-----"));

    let received = verify(&alice().public_key, &armored)
        .unwrap()
        .expect("should contain literal data");
    assert_eq!(received.text, "signed in the clear");
    assert_eq!(received.signatures.len(), 1);
    assert!(received.signatures[0].valid);
}

#[test]
fn test_verify_rejects_encrypted_messages() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(19);

    let armored =
        sign_and_encrypt(rng, &alice().public_key, &alice().secret_key, "sealed").unwrap();

    let err = verify(&alice().public_key, &armored).unwrap_err();
    assert!(err.to_string().contains("encrypted"));
}

#[test]
fn test_encrypt_without_signing() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(20);

    let armored = encrypt(rng, &bob().public_key, "unsigned").unwrap();
    let received = decrypt_and_verify(&bob().secret_key, &alice().public_key, &armored)
        .unwrap()
        .expect("should contain literal data");
    assert_eq!(received.text, "unsigned");
    assert!(received.signatures.is_empty());
}

#[test]
fn test_decrypt_and_verify_passes_through_unencrypted() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(21);

    let armored = sign(rng, &alice().secret_key, "not sealed").unwrap();

    let received = decrypt_and_verify(&bob().secret_key, &alice().public_key, &armored)
        .unwrap()
        .expect("should contain literal data");
    assert_eq!(received.text, "not sealed");
    assert!(received.signatures[0].valid);
}

#[test]
fn test_empty_recipient_list_is_rejected() {
    let _ = pretty_env_logger::try_init();
    let rng = ChaCha8Rng::seed_from_u64(22);

    let err =
        sign_and_encrypt(rng, Vec::<&PublicKey>::new(), &alice().secret_key, "x").unwrap_err();
    assert!(err.to_string().contains("at least one recipient"));
}

#[test]
#[ignore] // slow in debug mode
fn test_recipient_without_encryption_subkey_is_rejected() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(23);

    // a bare certify and sign key, no encryption subkey
    let params = pgp::composed::SecretKeyParamsBuilder::default()
        .key_type(pgp::composed::KeyType::Rsa(2048))
        .can_certify(true)
        .can_sign(true)
        .primary_user_id("Sign Only <signonly@example.org>".into())
        .build()
        .unwrap();
    let key = params.generate(&mut rng).unwrap();
    let signed = key.sign(&mut rng, || String::new()).unwrap();
    let armored = pgp::composed::SignedPublicKey::from(signed)
        .to_armored_string(None.into())
        .unwrap();
    let sign_only = PublicKey::from_armored(&armored).unwrap();

    let rng = ChaCha8Rng::seed_from_u64(24);
    let err = sign_and_encrypt(rng, &sign_only, &alice().secret_key, "cannot deliver").unwrap_err();
    assert!(matches!(err, Error::InvalidRecipientKey { .. }));
}

#[test]
fn test_signed_wrapper_over_encrypted_message_is_decrypted() {
    use pgp::composed::{Deserializable, Message, SignedPublicKey, SignedSecretKey};
    use pgp::crypto::hash::HashAlgorithm;
    use pgp::crypto::sym::SymmetricKeyAlgorithm;
    use pgp::types::PublicKeyTrait;

    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(25);

    // encrypt first, then sign over the ciphertext
    let (recipient, _) = SignedPublicKey::from_string(&bob().public_key_armored).unwrap();
    let subkeys: Vec<_> = recipient
        .public_subkeys
        .iter()
        .map(|subkey| &subkey.key)
        .filter(|key| key.is_encryption_key())
        .collect();
    let (signer, _) = SignedSecretKey::from_string(&alice().secret_key_armored).unwrap();

    let armored = Message::new_literal("", "wrapped")
        .encrypt_to_keys_seipdv1(&mut rng, SymmetricKeyAlgorithm::AES256, &subkeys)
        .unwrap()
        .sign(
            &mut rng,
            &signer,
            || PASSPHRASE.to_string(),
            HashAlgorithm::SHA2_256,
        )
        .unwrap()
        .to_armored_string(None.into())
        .unwrap();

    let received = decrypt_and_verify(&bob().secret_key, &alice().public_key, &armored)
        .unwrap()
        .expect("should contain literal data");
    assert_eq!(received.text, "wrapped");
}

#[tokio::test]
async fn test_async_round_trip() {
    let _ = pretty_env_logger::try_init();

    let armored = spawn_sign_and_encrypt(
        vec![bob().public_key.clone()],
        alice().secret_key.clone(),
        "spawned".into(),
    )
    .join()
    .await
    .unwrap();

    let received = spawn_decrypt_and_verify(
        bob().secret_key.clone(),
        vec![alice().public_key.clone()],
        armored,
    )
    .join()
    .await
    .unwrap()
    .expect("should contain literal data");
    assert_eq!(received.text, "spawned");
    assert!(received.signatures[0].valid);
}

#[tokio::test]
async fn test_cancelled_generation() {
    let _ = pretty_env_logger::try_init();

    let params = KeyPairParamsBuilder::default()
        .num_bits(2048)
        .primary_user_id("Cancelled <never@example.org>".into())
        .build()
        .unwrap();
    let op = spawn_generate(KeyPairFactory::new(), params);
    op.cancel();

    match op.join().await {
        Err(Error::OperationCancelled) => {}
        other => panic!("expected cancellation, got {:?}", other),
    }
}
