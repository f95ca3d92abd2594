//! Outbound messages: sign and encrypt.

use log::debug;
use pgp::composed::Message;
use pgp::crypto::hash::HashAlgorithm;
use pgp::crypto::sym::SymmetricKeyAlgorithm;
use rand::{CryptoRng, Rng};

use crate::errors::{Error, Result};
use crate::key::SecretKey;
use crate::message::KeyRing;

/// Signs `text` with `signer`, then encrypts it to every ring member.
///
/// The armored result decrypts with any single recipient's secret key.
/// Empty text is a valid message and round-trips as such. Fails with
/// [`Error::KeyLocked`] when the signer's secret material is locked.
pub fn sign_and_encrypt<'a, R, K>(
    mut rng: R,
    recipients: K,
    signer: &SecretKey,
    text: &str,
) -> Result<String>
where
    R: CryptoRng + Rng,
    K: Into<KeyRing<'a>>,
{
    let ring = recipients.into();
    ensure!(!ring.is_empty(), "at least one recipient key is required");

    let signing_key = signer.unlocked()?;
    let targets = ring.encryption_targets()?;

    debug!(
        "signing with {} and encrypting to {} recipients",
        signer.key_id_hex(),
        targets.len()
    );

    let signed = Message::new_literal("", text)
        .sign(&mut rng, signing_key, || String::new(), HashAlgorithm::SHA2_256)
        .map_err(|source| Error::Encryption { source })?;
    let encrypted = signed
        .encrypt_to_keys_seipdv1(&mut rng, SymmetricKeyAlgorithm::AES256, &targets)
        .map_err(|source| Error::Encryption { source })?;
    encrypted
        .to_armored_string(None.into())
        .map_err(|source| Error::Encryption { source })
}

/// Encrypts `text` to every ring member without signing it.
pub fn encrypt<'a, R, K>(mut rng: R, recipients: K, text: &str) -> Result<String>
where
    R: CryptoRng + Rng,
    K: Into<KeyRing<'a>>,
{
    let ring = recipients.into();
    ensure!(!ring.is_empty(), "at least one recipient key is required");
    let targets = ring.encryption_targets()?;

    debug!("encrypting {} bytes to {} recipients", text.len(), targets.len());

    let encrypted = Message::new_literal("", text)
        .encrypt_to_keys_seipdv1(&mut rng, SymmetricKeyAlgorithm::AES256, &targets)
        .map_err(|source| Error::Encryption { source })?;
    encrypted
        .to_armored_string(None.into())
        .map_err(|source| Error::Encryption { source })
}
