use std::path::PathBuf;

use thiserror::Error;

/// StorageError
///
/// Failures of the persistence layer itself: the file could not be read or written,
/// its contents could not be decoded, or a backend refused the write.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode records: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("storage backend rejected the write: {0}")]
    Rejected(String),
}

/// StoreError
///
/// Outcome of an item repository operation that did not succeed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item {0} not found")]
    NotFound(u64),

    /// The highest stored id is `u64::MAX`; no larger id can be assigned.
    #[error("item id space exhausted")]
    IdSpaceExhausted,

    /// Persisting the change failed; the in-memory collection was left untouched.
    #[error("storage failure: {0}")]
    StorageFailure(#[from] StorageError),
}

/// CredentialError
///
/// Keeps "no such user" apart from "could not check".
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("user not found")]
    NotFound,

    #[error("credential storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),
}

/// TokenError
#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed, mis-signed or otherwise unacceptable token.
    #[error("invalid token")]
    Invalid,

    /// Correctly signed, but past its expiry.
    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// LoginError
///
/// `InvalidCredentials` covers both an unknown username and a wrong password.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("credential storage unavailable: {0}")]
    StorageUnavailable(#[source] StorageError),

    #[error("password verification did not complete")]
    VerificationAborted,

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// ConfigError
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    MissingVar(&'static str),

    #[error("{0} must not be empty")]
    EmptyVar(&'static str),
}
