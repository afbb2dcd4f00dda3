//! Unpadded URL-safe base64, the encoding of every binary wire field.

use crate::error::{CryptoError, CryptoResult};
use base64ct::{Base64UrlUnpadded, Encoding};

/// Base64url encode bytes without padding.
pub fn base64url_encode(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Base64url decode a string to bytes.
///
/// Strict: padding characters and bytes outside the URL-safe alphabet are
/// rejected rather than skipped, so malformed tokens fail before any
/// cryptographic processing.
pub fn base64url_decode(s: &str) -> CryptoResult<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(s)
        .map_err(|_| CryptoError::Format("invalid base64url".to_string()))
}

/// Decode a named envelope field, reporting the field on failure.
pub(crate) fn decode_field(s: &str, field: &str) -> CryptoResult<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(s)
        .map_err(|_| CryptoError::Format(format!("invalid base64url in `{field}`")))
}
