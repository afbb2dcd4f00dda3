//! JWE envelope wire types.
//!
//! Two JSON-serialization envelopes are used on the wire:
//! - [`DocumentJwe`] carries an encrypted document body
//!   (`A256KW` key wrapping, `A256GCM` content encryption).
//! - [`WrappedMasterKey`] carries the password-wrapped master secret
//!   (`PBES2-HS512+A256KW`).
//!
//! All binary fields are unpadded base64url.

use crate::error::{CryptoError, CryptoResult};
use serde::{Deserialize, Serialize};

/// Content-key wrapping algorithm for document envelopes.
pub const CEK_ALG: &str = "A256KW";

/// Content encryption algorithm for document envelopes.
pub const CONTENT_ENC: &str = "A256GCM";

/// Password-wrap algorithm for the master secret.
pub const PASSWORD_ALG: &str = "PBES2-HS512+A256KW";

/// PBKDF2 iteration count used when wrapping (any positive count is
/// accepted when unwrapping).
pub const PBES2_ITERATIONS: u32 = 4096;

/// Salt length in bytes for freshly wrapped master keys.
pub const PBES2_SALT_LEN: usize = 32;

/// Unprotected header of a document envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JweHeader {
    pub alg: String,
    pub enc: String,
}

impl Default for JweHeader {
    fn default() -> Self {
        Self {
            alg: CEK_ALG.to_string(),
            enc: CONTENT_ENC.to_string(),
        }
    }
}

/// Envelope for a single encrypted document body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentJwe {
    pub unprotected: JweHeader,
    pub encrypted_key: String,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}

impl DocumentJwe {
    /// Reject envelopes produced under a different algorithm pair.
    pub fn validate_header(&self) -> CryptoResult<()> {
        if self.unprotected.alg != CEK_ALG {
            return Err(CryptoError::Format(format!(
                "unsupported key-wrap algorithm `{}`",
                self.unprotected.alg
            )));
        }
        if self.unprotected.enc != CONTENT_ENC {
            return Err(CryptoError::Format(format!(
                "unsupported content encryption `{}`",
                self.unprotected.enc
            )));
        }
        Ok(())
    }
}

/// PBES2 header of a wrapped master key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pbes2Header {
    pub alg: String,
    /// PBKDF2 iteration count.
    pub p2c: u32,
    /// PBKDF2 salt, base64url.
    pub p2s: String,
}

/// The master secret wrapped under a password-derived key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedMasterKey {
    pub header: Pbes2Header,
    pub encrypted_key: String,
}

impl WrappedMasterKey {
    pub fn validate_header(&self) -> CryptoResult<()> {
        if self.header.alg != PASSWORD_ALG {
            return Err(CryptoError::Format(format!(
                "unsupported password-wrap algorithm `{}`",
                self.header.alg
            )));
        }
        if self.header.p2c == 0 {
            return Err(CryptoError::Format(
                "iteration count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
