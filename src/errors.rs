use snafu::Snafu;

pub type Result<T, E = Error> = ::std::result::Result<T, E>;

/// Error types
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unsupported key type {key_type}, only RSA is supported"))]
    UnsupportedKeyType { key_type: String },
    #[snafu(display("key generation failed: {message}"))]
    KeyGeneration { message: String },
    #[snafu(display("recipient key {key_id} cannot be used for encryption"))]
    InvalidRecipientKey { key_id: String },
    #[snafu(display("secret key material is locked"))]
    KeyLocked,
    #[snafu(display("encryption failed"))]
    Encryption { source: pgp::errors::Error },
    #[snafu(display("none of the provided secret keys match the message recipients"))]
    NoMatchingRecipientKey,
    #[snafu(display("decryption failed"))]
    Decryption { source: pgp::errors::Error },
    #[snafu(display("operation was cancelled"))]
    OperationCancelled,
    #[snafu(display("{message}"))]
    Message { message: String },
}

impl From<String> for Error {
    fn from(err: String) -> Error {
        Error::Message { message: err }
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Error {
        Error::Message {
            message: err.to_string(),
        }
    }
}

#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::Error::Message { message: $e.to_string() })
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::errors::Error::Message { message: format!($fmt, $($arg)+) })
    };
}

#[macro_export]
macro_rules! format_err {
    ($e:expr) => {
        $crate::errors::Error::Message { message: $e.to_string() }
    };
    ($fmt:expr, $($arg:tt)+) => {
        $crate::errors::Error::Message { message: format!($fmt, $($arg)+) }
    };
}

#[macro_export(local_inner_macros)]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            bail!($e);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)+) => {
        if !($cond) {
            bail!($fmt, $($arg)+);
        }
    };
}
