//! Running key and message operations off the caller's thread.
//!
//! RSA key generation and encryption are CPU heavy. [`spawn_operation`]
//! moves such work onto tokio's blocking thread pool and hands back an
//! [`Operation`] that can be awaited or cancelled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use tokio::task::JoinHandle;

use crate::errors::{Error, Result};
use crate::key::{KeyPair, KeyPairFactory, KeyPairParams, PublicKey, SecretKey};
use crate::message::{decrypt_and_verify, sign_and_encrypt, VerifiedMessage};

/// Handle to a spawned operation.
///
/// Dropping the handle detaches the operation. After [`Operation::cancel`],
/// [`Operation::join`] reports [`Error::OperationCancelled`] even when the
/// underlying work finished before the abort landed; the output is dropped.
#[derive(Debug)]
pub struct Operation<T> {
    handle: JoinHandle<Result<T>>,
    cancelled: Arc<AtomicBool>,
}

impl<T> Operation<T> {
    /// Requests cancellation. Safe to call more than once.
    pub fn cancel(&self) {
        debug!("cancelling operation");
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Waits for the operation and returns its output.
    pub async fn join(self) -> Result<T> {
        let cancelled = self.cancelled.clone();
        match self.handle.await {
            Ok(result) => {
                if cancelled.load(Ordering::SeqCst) {
                    return Err(Error::OperationCancelled);
                }
                result
            }
            Err(err) if err.is_cancelled() => Err(Error::OperationCancelled),
            Err(err) => Err(format_err!("background task failed: {}", err)),
        }
    }
}

/// Runs `f` on the blocking thread pool.
///
/// A blocking closure that has already started cannot be interrupted; the
/// cancellation flag makes sure its output is still discarded.
pub fn spawn_operation<T, F>(f: F) -> Operation<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let handle = tokio::task::spawn_blocking(f);
    Operation { handle, cancelled }
}

/// Generates a key pair on the blocking pool.
pub fn spawn_generate(factory: KeyPairFactory, params: KeyPairParams) -> Operation<KeyPair> {
    spawn_operation(move || factory.generate(rand::thread_rng(), params))
}

/// Signs and encrypts on the blocking pool. Keys and text are moved into
/// the task; clone them when the originals are still needed.
pub fn spawn_sign_and_encrypt(
    recipients: Vec<PublicKey>,
    signer: SecretKey,
    text: String,
) -> Operation<String> {
    spawn_operation(move || sign_and_encrypt(rand::thread_rng(), &recipients, &signer, &text))
}

/// Decrypts and verifies on the blocking pool.
pub fn spawn_decrypt_and_verify(
    recipient: SecretKey,
    verifiers: Vec<PublicKey>,
    armored: String,
) -> Operation<Option<VerifiedMessage>> {
    spawn_operation(move || decrypt_and_verify(&recipient, &verifiers, &armored))
}
