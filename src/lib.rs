//! High-level OpenPGP operations on top of [rPGP](https://crates.io/crates/pgp):
//! RSA key pair generation, combined sign and encrypt, combined decrypt and
//! verify, with armored strings as the interchange format.
//!
//! Secret keys carry a lock state. A key generated with a passphrase starts
//! locked and must be unlocked before it can sign or decrypt; the armored
//! form stays passphrase protected either way.
//!
//! ```no_run
//! use pgp_ops::{decrypt_and_verify, sign_and_encrypt};
//! use pgp_ops::{KeyPairFactory, KeyPairParamsBuilder};
//!
//! let factory = KeyPairFactory::new();
//!
//! let params = KeyPairParamsBuilder::default()
//!     .num_bits(2048)
//!     .primary_user_id("Alice <alice@example.org>".into())
//!     .passphrase(Some("correct horse".into()))
//!     .build()
//!     .unwrap();
//! let mut alice = factory.generate(rand::thread_rng(), params).unwrap();
//! alice.secret_key.unlock("correct horse").unwrap();
//!
//! let params = KeyPairParamsBuilder::default()
//!     .num_bits(2048)
//!     .primary_user_id("Bob <bob@example.org>".into())
//!     .build()
//!     .unwrap();
//! let bob = factory.generate(rand::thread_rng(), params).unwrap();
//!
//! let armored = sign_and_encrypt(
//!     rand::thread_rng(),
//!     &bob.public_key,
//!     &alice.secret_key,
//!     "hello bob",
//! )
//! .unwrap();
//!
//! let received = decrypt_and_verify(&bob.secret_key, &alice.public_key, &armored)
//!     .unwrap()
//!     .expect("literal data");
//! assert_eq!(received.text, "hello bob");
//! assert!(received.signatures.iter().all(|sig| sig.valid));
//! ```

#[macro_use]
pub mod errors;

pub mod key;
pub mod message;
pub mod task;

pub use crate::errors::{Error, Result};
pub use crate::key::{
    KeyAlgorithm, KeyPair, KeyPairFactory, KeyPairParams, KeyPairParamsBuilder, PublicKey,
    SecretKey,
};
pub use crate::message::{
    decrypt_and_verify, encrypt, sign, sign_and_encrypt, verify, KeyRing, VerificationResult,
    VerifiedMessage,
};
pub use crate::task::{
    spawn_decrypt_and_verify, spawn_generate, spawn_operation, spawn_sign_and_encrypt, Operation,
};
