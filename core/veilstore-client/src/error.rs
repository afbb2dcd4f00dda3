//! Client error taxonomy.

use thiserror::Error;
use veilstore_crypto::CryptoError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by store operations.
///
/// Every error propagates to the caller of the facade operation; nothing
/// is swallowed. A cache-expired master key is not an error — the next
/// operation transparently re-requests it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller misuse: bad filter shape, non-string document id, empty
    /// account id, double listener registration.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Structurally invalid wire data: malformed envelope, missing
    /// required fields, undecodable JSON.
    #[error("format error: {0}")]
    Format(String),

    /// AEAD or key-wrap authentication failure. Never distinguishes cause.
    #[error("crypto error: {0}")]
    Crypto(#[source] CryptoError),

    #[error("not found: {0}")]
    NotFound(String),

    /// Create precondition or conflict: the record already exists.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Any other transport-level failure, with the HTTP status if one
    /// was received.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// The operation was aborted at a suspension point.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<CryptoError> for StoreError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Format(msg) => StoreError::Format(msg),
            other => StoreError::Crypto(other),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Format(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
