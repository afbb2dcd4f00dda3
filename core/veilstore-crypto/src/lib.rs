//! Cryptographic core for VeilStore.
//!
//! Provides the key hierarchy and envelope formats for a client-side
//! encrypted document store:
//! - AES-256-GCM / AES-KW document envelopes (JWE with an unprotected
//!   header, `A256KW` + `A256GCM`)
//! - PBES2-HS512+A256KW password wrapping of the master secret
//! - deterministic HMAC-SHA-256 blinding for searchable index tokens
//!
//! The server sees only envelopes and blinded tokens; every secret held
//! by this crate zeroizes on drop.

pub mod base64url;
pub mod cipher;
pub mod error;
pub mod jwe;
pub mod kdf;
pub mod keywrap;
pub mod master_key;

pub use base64url::{base64url_decode, base64url_encode};
pub use error::{CryptoError, CryptoResult};
pub use jwe::{
    DocumentJwe, JweHeader, Pbes2Header, WrappedMasterKey, CEK_ALG, CONTENT_ENC, PASSWORD_ALG,
    PBES2_ITERATIONS, PBES2_SALT_LEN,
};
pub use master_key::MasterKey;
