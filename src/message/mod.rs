//! Message operations: sign, encrypt, decrypt, verify.
//!
//! The combined operations [`sign_and_encrypt`] and [`decrypt_and_verify`]
//! cover the usual messaging flow; [`sign`], [`verify`] and [`encrypt`] are
//! the standalone halves. All of them take their public key arguments as
//! `impl Into<KeyRing>`, so a single key and a list of keys both work.

use log::warn;
use pgp::composed::Message;
use pgp::packet::{PublicSubkey, Signature};

use crate::errors::{Error, Result};
use crate::key::PublicKey;

mod decrypt;
mod encrypt;
mod sign;

pub use self::decrypt::decrypt_and_verify;
pub use self::encrypt::{encrypt, sign_and_encrypt};
pub use self::sign::{sign, verify};

/// Reported when a signature names no issuer and no ring member verifies it.
const WILDCARD_KEY_ID: &str = "0000000000000000";

/// One or many public keys, normalized at the call boundary.
///
/// Operations reject an empty ring up front rather than silently encrypting
/// to nobody or verifying against nothing.
#[derive(Debug, Clone)]
pub struct KeyRing<'a> {
    keys: Vec<&'a PublicKey>,
}

impl<'a> KeyRing<'a> {
    pub fn keys(&self) -> &[&'a PublicKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The encryption subkey of every ring member, in ring order.
    ///
    /// Keys are generated with a dedicated encryption subkey; a key without
    /// one cannot receive messages and is rejected here.
    pub(crate) fn encryption_targets(&self) -> Result<Vec<&'a PublicSubkey>> {
        self.keys
            .iter()
            .map(|key| {
                key.encryption_subkey()
                    .ok_or_else(|| Error::InvalidRecipientKey {
                        key_id: key.key_id_hex(),
                    })
            })
            .collect()
    }
}

impl<'a> From<&'a PublicKey> for KeyRing<'a> {
    fn from(key: &'a PublicKey) -> Self {
        KeyRing { keys: vec![key] }
    }
}

impl<'a> From<Vec<&'a PublicKey>> for KeyRing<'a> {
    fn from(keys: Vec<&'a PublicKey>) -> Self {
        KeyRing { keys }
    }
}

impl<'a> From<&'a [PublicKey]> for KeyRing<'a> {
    fn from(keys: &'a [PublicKey]) -> Self {
        KeyRing {
            keys: keys.iter().collect(),
        }
    }
}

impl<'a> From<&'a Vec<PublicKey>> for KeyRing<'a> {
    fn from(keys: &'a Vec<PublicKey>) -> Self {
        keys.as_slice().into()
    }
}

/// Outcome of checking a single signature packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Hex encoded id of the issuing key, or the all-zero wildcard id for a
    /// signature that names no issuer and matched no ring member.
    pub key_id: String,
    pub valid: bool,
}

/// A decrypted or plain signed message together with its signature checks.
///
/// Signatures from keys outside the verification ring are kept, reported as
/// not valid, so callers see every signature the message carries.
#[derive(Debug, Clone)]
pub struct VerifiedMessage {
    pub text: String,
    pub signatures: Vec<VerificationResult>,
}

/// True when `message` is, or wraps, an encrypted container.
///
/// A signature layer can sit outside the ciphertext; decryption has to look
/// through it rather than treat the message as plain.
pub(crate) fn contains_encrypted(message: &Message) -> bool {
    match message {
        Message::Encrypted { .. } => true,
        Message::Signed {
            message: Some(inner),
            ..
        } => contains_encrypted(inner),
        _ => false,
    }
}

fn verify_one(signature: &Signature, data: &[u8], keys: &[&PublicKey]) -> VerificationResult {
    let issuers = signature.issuer();
    if issuers.is_empty() {
        // Wildcard signature, try every candidate key.
        for key in keys {
            if key.try_verify_any(signature, data) {
                return VerificationResult {
                    key_id: key.key_id_hex(),
                    valid: true,
                };
            }
        }
        return VerificationResult {
            key_id: WILDCARD_KEY_ID.into(),
            valid: false,
        };
    }

    for issuer in &issuers {
        for key in keys {
            if let Some(valid) = key.try_verify(issuer, signature, data) {
                return VerificationResult {
                    key_id: hex::encode(issuer.as_ref()),
                    valid,
                };
            }
        }
    }

    // No ring member owns the issuer.
    VerificationResult {
        key_id: hex::encode(issuers[0].as_ref()),
        valid: false,
    }
}

/// Checks every signature layer of `message` against `keys`.
///
/// Each layer signs the innermost literal data, so all of them verify over
/// the same bytes.
pub(crate) fn collect_signatures(message: &Message, keys: &[&PublicKey]) -> Vec<VerificationResult> {
    let data = match message.get_literal() {
        Some(literal) => literal.data(),
        None => return Vec::new(),
    };

    let mut results = Vec::new();
    let mut current = message;
    while let Message::Signed {
        message, signature, ..
    } = current
    {
        let result = verify_one(signature, data, keys);
        if !result.valid {
            warn!("signature by {} did not verify", result.key_id);
        }
        results.push(result);
        match message {
            Some(inner) => current = inner.as_ref(),
            None => break,
        }
    }
    results
}

/// Pulls the literal text out of `message` and verifies its signatures.
///
/// Returns `None` for messages without literal data, e.g. a detached
/// signature that was decrypted on its own.
pub(crate) fn extract_and_verify(
    message: Message,
    ring: &KeyRing<'_>,
) -> Result<Option<VerifiedMessage>> {
    let message = message
        .decompress()
        .map_err(|source| Error::Decryption { source })?;

    let literal = match message.get_literal() {
        Some(literal) => literal,
        None => return Ok(None),
    };
    let text = String::from_utf8_lossy(literal.data()).to_string();
    let signatures = collect_signatures(&message, ring.keys());

    Ok(Some(VerifiedMessage { text, signatures }))
}
