//! Standalone signing and verification of armored messages.

use log::debug;
use pgp::composed::{Deserializable, Message};
use pgp::crypto::hash::HashAlgorithm;
use rand::{CryptoRng, Rng};

use crate::errors::Result;
use crate::key::SecretKey;
use crate::message::{contains_encrypted, extract_and_verify, KeyRing, VerifiedMessage};

/// Signs `text` with `signer` and returns the armored signed message.
///
/// The output is not encrypted; anyone holding the signer's public key can
/// read and verify it.
pub fn sign<R>(mut rng: R, signer: &SecretKey, text: &str) -> Result<String>
where
    R: CryptoRng + Rng,
{
    let signing_key = signer.unlocked()?;

    debug!("signing {} bytes with {}", text.len(), signer.key_id_hex());

    let signed = Message::new_literal("", text)
        .sign(&mut rng, signing_key, || String::new(), HashAlgorithm::SHA2_256)
        .map_err(|err| format_err!("signing failed: {}", err))?;
    signed
        .to_armored_string(None.into())
        .map_err(|err| format_err!("signing failed: {}", err))
}

/// Verifies the signatures of an armored, unencrypted message.
///
/// Returns the literal text together with one verification result per
/// signature, or `Ok(None)` when the message carries no literal data.
pub fn verify<'a, K>(verifiers: K, armored: &str) -> Result<Option<VerifiedMessage>>
where
    K: Into<KeyRing<'a>>,
{
    let ring = verifiers.into();
    ensure!(!ring.is_empty(), "at least one verification key is required");

    let (message, _headers) =
        Message::from_string(armored).map_err(|err| format_err!("invalid message: {}", err))?;
    ensure!(
        !contains_encrypted(&message),
        "message is encrypted, decrypt it instead"
    );

    extract_and_verify(message, &ring)
}
