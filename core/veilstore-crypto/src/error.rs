use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the crypto layer.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD or key-wrap authentication failure.
    ///
    /// Deliberately carries no detail: a flipped ciphertext bit, a wrong
    /// key and a wrong password are indistinguishable to callers.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("encryption failed")]
    EncryptionFailed,

    /// Structural defect in an envelope: bad base64url, a missing or
    /// misshaped field, an unexpected algorithm identifier.
    #[error("malformed envelope: {0}")]
    Format(String),
}
