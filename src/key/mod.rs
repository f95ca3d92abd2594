//! Key wrappers around the composed rPGP key types.
//!
//! A [`SecretKey`] owns a transferable secret key (primary plus subkeys) and
//! tracks whether its private material is currently usable. Passphrase
//! protected keys start out locked; [`SecretKey::unlock`] makes them usable,
//! [`SecretKey::lock`] discards the decrypted material again.

use std::fmt;

use log::debug;
use pgp::composed::{Deserializable, SignedPublicKey, SignedSecretKey};
use pgp::packet::{PublicSubkey, Signature};
use pgp::types::{KeyId, PublicKeyTrait};

use crate::errors::{Error, Result};

mod factory;

pub use self::factory::{
    KeyAlgorithm, KeyPair, KeyPairFactory, KeyPairParams, KeyPairParamsBuilder,
};

/// A secret key with an explicit lock state.
///
/// `inner` is the key as generated or parsed, with its secret parameters
/// still S2K-encrypted when a passphrase protects them. `plain` holds the
/// decrypted form while the key is unlocked.
#[derive(Clone)]
pub struct SecretKey {
    inner: SignedSecretKey,
    plain: Option<SignedSecretKey>,
}

impl SecretKey {
    pub(crate) fn new(inner: SignedSecretKey, plain: Option<SignedSecretKey>) -> Self {
        SecretKey { inner, plain }
    }

    /// Parses an armored secret key block.
    ///
    /// The lock state is derived from the key material: a key whose secret
    /// parameters are S2K-encrypted starts out locked.
    pub fn from_armored(input: &str) -> Result<Self> {
        let (key, _headers) = SignedSecretKey::from_string(input)
            .map_err(|err| format_err!("invalid armored secret key: {}", err))?;
        key.verify()
            .map_err(|err| format_err!("invalid secret key: {}", err))?;

        let plain = if key.primary_key.secret_params().is_encrypted() {
            None
        } else {
            Some(key.clone())
        };

        Ok(SecretKey { inner: key, plain })
    }

    pub fn to_armored(&self) -> Result<String> {
        self.inner
            .to_armored_string(None.into())
            .map_err(|err| format_err!("failed to armor secret key: {}", err))
    }

    /// True while the private material is unusable without [`unlock`](Self::unlock).
    pub fn is_locked(&self) -> bool {
        self.plain.is_none()
    }

    /// Decrypts the private material with `passphrase`.
    ///
    /// A wrong passphrase fails with [`Error::KeyLocked`] and leaves the key
    /// locked. Unlocking an already unlocked key is a no-op.
    pub fn unlock(&mut self, passphrase: &str) -> Result<()> {
        if self.plain.is_some() {
            return Ok(());
        }

        let mut plain = self.inner.clone();
        plain
            .primary_key
            .remove_password(|| passphrase.to_string())
            .map_err(|_| Error::KeyLocked)?;
        for subkey in &mut plain.secret_subkeys {
            if subkey.key.secret_params().is_encrypted() {
                subkey
                    .key
                    .remove_password(|| passphrase.to_string())
                    .map_err(|_| Error::KeyLocked)?;
            }
        }

        debug!("unlocked secret key {}", self.key_id_hex());
        self.plain = Some(plain);
        Ok(())
    }

    /// Discards the decrypted private material.
    ///
    /// Only keys that carry passphrase protection can be locked; a key
    /// generated without a passphrase has no protected form to return to.
    pub fn lock(&mut self) -> Result<()> {
        ensure!(
            self.inner.primary_key.secret_params().is_encrypted(),
            "key has no passphrase protection and cannot be locked"
        );
        self.plain = None;
        debug!("locked secret key {}", self.key_id_hex());
        Ok(())
    }

    /// The decrypted key, or [`Error::KeyLocked`].
    pub(crate) fn unlocked(&self) -> Result<&SignedSecretKey> {
        self.plain.as_ref().ok_or(Error::KeyLocked)
    }

    /// The public half of this key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.clone().into(),
        }
    }

    pub fn key_id(&self) -> KeyId {
        self.inner.key_id()
    }

    /// Primary key id as lowercase hex.
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.inner.key_id().as_ref())
    }

    /// Primary key fingerprint as lowercase hex.
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.inner.fingerprint().as_bytes())
    }

    /// The first user id certified on the primary key.
    pub fn user_id(&self) -> Option<String> {
        self.inner
            .details
            .users
            .first()
            .map(|user| user.id.id().to_string())
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("key_id", &self.key_id_hex())
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// A public key usable as an encryption recipient or signature verifier.
#[derive(Clone)]
pub struct PublicKey {
    inner: SignedPublicKey,
}

impl PublicKey {
    pub(crate) fn new(inner: SignedPublicKey) -> Self {
        PublicKey { inner }
    }

    /// Parses an armored public key block.
    pub fn from_armored(input: &str) -> Result<Self> {
        let (key, _headers) = SignedPublicKey::from_string(input)
            .map_err(|err| format_err!("invalid armored public key: {}", err))?;
        key.verify()
            .map_err(|err| format_err!("invalid public key: {}", err))?;

        Ok(PublicKey { inner: key })
    }

    pub fn to_armored(&self) -> Result<String> {
        self.inner
            .to_armored_string(None.into())
            .map_err(|err| format_err!("failed to armor public key: {}", err))
    }

    pub fn key_id(&self) -> KeyId {
        self.inner.key_id()
    }

    /// Primary key id as lowercase hex.
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.inner.key_id().as_ref())
    }

    /// Primary key fingerprint as lowercase hex.
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.inner.fingerprint().as_bytes())
    }

    /// The first user id certified on the primary key.
    pub fn user_id(&self) -> Option<String> {
        self.inner
            .details
            .users
            .first()
            .map(|user| user.id.id().to_string())
    }

    /// The subkey messages to this key get encrypted to.
    pub(crate) fn encryption_subkey(&self) -> Option<&PublicSubkey> {
        self.inner
            .public_subkeys
            .iter()
            .map(|subkey| &subkey.key)
            .find(|key| key.is_encryption_key())
    }

    /// Checks `signature` over `data` if `issuer` names this key or one of
    /// its subkeys. `None` means the issuer is not part of this key at all.
    pub(crate) fn try_verify(
        &self,
        issuer: &KeyId,
        signature: &Signature,
        data: &[u8],
    ) -> Option<bool> {
        if &self.inner.primary_key.key_id() == issuer {
            return Some(signature.verify(&self.inner.primary_key, data).is_ok());
        }
        for subkey in &self.inner.public_subkeys {
            if &subkey.key.key_id() == issuer {
                return Some(signature.verify(&subkey.key, data).is_ok());
            }
        }
        None
    }

    /// Checks `signature` over `data` against the primary key and every
    /// subkey, for signatures that do not name an issuer.
    pub(crate) fn try_verify_any(&self, signature: &Signature, data: &[u8]) -> bool {
        if signature.verify(&self.inner.primary_key, data).is_ok() {
            return true;
        }
        self.inner
            .public_subkeys
            .iter()
            .any(|subkey| signature.verify(&subkey.key, data).is_ok())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("key_id", &self.key_id_hex())
            .finish()
    }
}
