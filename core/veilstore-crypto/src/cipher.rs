//! AES-256-GCM with a detached 16-byte tag.
//!
//! The envelope format carries `ciphertext` and `tag` as separate fields,
//! so the combined output of the AEAD is split here and rejoined on
//! decrypt. Associated data is always empty.

use crate::error::{CryptoError, CryptoResult};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const IV_LEN: usize = 12;

/// AEAD authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext`, returning the ciphertext and the detached tag.
pub fn encrypt(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> CryptoResult<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = Aes256Gcm::new(key.into());
    let mut combined = cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let split = combined.len() - TAG_LEN;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&combined[split..]);
    combined.truncate(split);
    Ok((combined, tag))
}

/// Decrypt `ciphertext` with its detached `tag`.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> CryptoResult<Vec<u8>> {
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    let cipher = Aes256Gcm::new(key.into());
    cipher
        .decrypt(Nonce::from_slice(iv), combined.as_slice())
        .map_err(|_| CryptoError::AuthenticationFailed)
}
