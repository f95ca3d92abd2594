//! RSA key pair generation.
//!
//! [`KeyPairFactory`] drives the underlying key builder: an RSA primary key
//! flagged for certification and signing, one RSA encryption subkey of the
//! same strength, the user id certified onto the primary key, and the secret
//! material S2K-protected under the supplied passphrase.

use std::fmt;

use derive_builder::Builder;
use log::debug;
use pgp::composed::{KeyType, SecretKeyParamsBuilder, SignedPublicKey, SubkeyParamsBuilder};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::key::{PublicKey, SecretKey};

/// Requested asymmetric algorithm for a new key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Dsa,
    Elgamal,
    Ecdsa,
    EdDsa,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "rsa"),
            KeyAlgorithm::Dsa => write!(f, "dsa"),
            KeyAlgorithm::Elgamal => write!(f, "elgamal"),
            KeyAlgorithm::Ecdsa => write!(f, "ecdsa"),
            KeyAlgorithm::EdDsa => write!(f, "eddsa"),
        }
    }
}

/// Inputs for one key pair generation.
///
/// The passphrase lives in zeroizing storage and is wiped when the params
/// are dropped, whether or not a key was generated from them.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct KeyPairParams {
    /// Requested algorithm; everything but RSA is rejected by the factory.
    #[builder(default = "KeyAlgorithm::Rsa")]
    key_algorithm: KeyAlgorithm,
    /// Strength of the primary key and the subkey, in bits.
    num_bits: u32,
    /// Pre-formatted identity, e.g. `"Alice <alice@example.org>"`.
    primary_user_id: String,
    #[builder(setter(custom), default)]
    passphrase: Option<Zeroizing<String>>,
    /// Leave the returned key usable without an explicit unlock. The armored
    /// secret key stays passphrase protected either way.
    #[builder(default)]
    unlocked: bool,
}

impl fmt::Debug for KeyPairParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairParams")
            .field("key_algorithm", &self.key_algorithm)
            .field("num_bits", &self.num_bits)
            .field("primary_user_id", &self.primary_user_id)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .field("unlocked", &self.unlocked)
            .finish()
    }
}

impl KeyPairParamsBuilder {
    /// Protects the secret material via S2K. An empty or missing passphrase
    /// leaves the key unprotected.
    pub fn passphrase(&mut self, passphrase: Option<String>) -> &mut Self {
        self.passphrase = Some(passphrase.map(Zeroizing::new));
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(num_bits) = self.num_bits {
            if num_bits < 1024 {
                return Err("Keys with less than 1024 bits are considered insecure".into());
            }
        }
        if let Some(primary_user_id) = &self.primary_user_id {
            if primary_user_id.is_empty() {
                return Err("primary user id must not be empty".into());
            }
        }
        Ok(())
    }
}

/// The product of [`KeyPairFactory::generate`].
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    /// Armored secret key block, passphrase protected when one was given.
    pub secret_key_armored: String,
    pub public_key_armored: String,
}

/// Produces RSA key pairs under a configurable size policy.
#[derive(Debug, Clone, Copy)]
pub struct KeyPairFactory {
    min_rsa_bits: u32,
}

impl Default for KeyPairFactory {
    fn default() -> Self {
        KeyPairFactory { min_rsa_bits: 2048 }
    }
}

impl KeyPairFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with a non-default size floor. The underlying key builder
    /// keeps its own floor, so lowering this below 2048 only changes which
    /// layer rejects the request.
    pub fn with_min_rsa_bits(min_rsa_bits: u32) -> Self {
        KeyPairFactory { min_rsa_bits }
    }

    /// Generates a primary key plus encryption subkey per `params`.
    ///
    /// This is CPU heavy for realistic RSA sizes; see [`crate::task`] for
    /// running it off the caller's thread.
    pub fn generate<R: CryptoRng + Rng>(
        &self,
        mut rng: R,
        params: KeyPairParams,
    ) -> Result<KeyPair> {
        let KeyPairParams {
            key_algorithm,
            num_bits,
            primary_user_id,
            passphrase,
            unlocked,
        } = params;

        match key_algorithm {
            KeyAlgorithm::Rsa => {}
            other => {
                return Err(Error::UnsupportedKeyType {
                    key_type: other.to_string(),
                });
            }
        }
        if num_bits < self.min_rsa_bits {
            return Err(Error::KeyGeneration {
                message: format!(
                    "{} bit keys are below the configured minimum of {} bits",
                    num_bits, self.min_rsa_bits
                ),
            });
        }

        debug!("generating {} bit rsa key pair for {}", num_bits, primary_user_id);

        let subkey = SubkeyParamsBuilder::default()
            .key_type(KeyType::Rsa(num_bits))
            .can_encrypt(true)
            .build()
            .map_err(|err| Error::KeyGeneration {
                message: err.to_string(),
            })?;
        let key_params = SecretKeyParamsBuilder::default()
            .key_type(KeyType::Rsa(num_bits))
            .can_certify(true)
            .can_sign(true)
            .primary_user_id(primary_user_id)
            .subkey(subkey)
            .build()
            .map_err(|err| Error::KeyGeneration {
                message: err.to_string(),
            })?;

        let secret_key = key_params.generate(&mut rng).map_err(|err| Error::KeyGeneration {
            message: err.to_string(),
        })?;
        let signed = secret_key
            .sign(&mut rng, || String::new())
            .map_err(|err| Error::KeyGeneration {
                message: err.to_string(),
            })?;

        let protected = match passphrase.as_deref() {
            Some(pass) if !pass.is_empty() => {
                let mut key = signed.clone();
                key.primary_key
                    .set_password(&mut rng, || pass.to_string())
                    .map_err(|err| Error::KeyGeneration {
                        message: err.to_string(),
                    })?;
                for subkey in &mut key.secret_subkeys {
                    subkey
                        .key
                        .set_password(&mut rng, || pass.to_string())
                        .map_err(|err| Error::KeyGeneration {
                            message: err.to_string(),
                        })?;
                }
                Some(key)
            }
            _ => None,
        };

        let secret_key_armored = protected
            .as_ref()
            .unwrap_or(&signed)
            .to_armored_string(None.into())
            .map_err(|err| Error::KeyGeneration {
                message: err.to_string(),
            })?;
        let public: SignedPublicKey = signed.clone().into();
        let public_key_armored =
            public
                .to_armored_string(None.into())
                .map_err(|err| Error::KeyGeneration {
                    message: err.to_string(),
                })?;

        let secret_key = match protected {
            None => SecretKey::new(signed.clone(), Some(signed)),
            Some(key) if unlocked => SecretKey::new(key, Some(signed)),
            Some(key) => SecretKey::new(key, None),
        };

        debug!("generated key pair {}", secret_key.key_id_hex());

        Ok(KeyPair {
            secret_key,
            public_key: PublicKey::new(public),
            secret_key_armored,
            public_key_armored,
        })
    }
}
