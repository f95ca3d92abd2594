//! Inbound messages: decrypt and verify.

use log::debug;
use pgp::composed::{Deserializable, Message};

use crate::errors::{Error, Result};
use crate::key::SecretKey;
use crate::message::{contains_encrypted, extract_and_verify, KeyRing, VerifiedMessage};

/// Decrypts `armored` with `recipient`, then verifies every signature the
/// message carries against `verifiers`.
///
/// Returns `Ok(None)` when the decrypted message contains no literal data.
/// Signatures by keys outside the ring are reported with `valid: false`
/// rather than dropped. Unencrypted input, e.g. a plain signed message, is
/// passed through to verification.
///
/// Fails with [`Error::KeyLocked`] when the recipient key is locked and
/// [`Error::NoMatchingRecipientKey`] when the message was encrypted to
/// other keys.
pub fn decrypt_and_verify<'a, K>(
    recipient: &SecretKey,
    verifiers: K,
    armored: &str,
) -> Result<Option<VerifiedMessage>>
where
    K: Into<KeyRing<'a>>,
{
    let ring = verifiers.into();
    ensure!(!ring.is_empty(), "at least one verification key is required");

    let secret = recipient.unlocked()?;

    let (message, _headers) =
        Message::from_string(armored).map_err(|source| Error::Decryption { source })?;

    let message = if contains_encrypted(&message) {
        let (decrypted, key_ids) = message
            .decrypt(|| String::new(), &[secret])
            .map_err(|source| match source {
                pgp::errors::Error::MissingKey => Error::NoMatchingRecipientKey,
                source => Error::Decryption { source },
            })?;
        debug!("decrypted with {} matching keys", key_ids.len());
        decrypted
    } else {
        message
    };

    extract_and_verify(message, &ring)
}
