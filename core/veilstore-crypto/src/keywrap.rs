//! AES Key Wrap (RFC 3394) for content keys and the wrapped master secret.

use crate::error::{CryptoError, CryptoResult};
use aes_kw::Kek;
use zeroize::Zeroizing;

/// AES-KW adds one 64-bit integrity block.
const KW_OVERHEAD: usize = 8;

/// Wrap `material` under `kek`.
///
/// The material must be a non-empty multiple of 8 bytes and at least two
/// 64-bit blocks long; the output is 8 bytes longer than the input.
pub fn wrap(kek: &[u8; 32], material: &[u8]) -> CryptoResult<Vec<u8>> {
    if material.len() < 16 || material.len() % 8 != 0 {
        return Err(CryptoError::Format(format!(
            "key material must be a multiple of 8 bytes and >= 16, got {}",
            material.len()
        )));
    }

    let kek = Kek::from(*kek);
    let mut wrapped = vec![0u8; material.len() + KW_OVERHEAD];
    kek.wrap(material, &mut wrapped)
        .map_err(|_| CryptoError::EncryptionFailed)?;
    Ok(wrapped)
}

/// Unwrap `wrapped`, returning the original material in a zeroizing buffer.
pub fn unwrap(kek: &[u8; 32], wrapped: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    if wrapped.len() < 24 || wrapped.len() % 8 != 0 {
        return Err(CryptoError::Format(format!(
            "wrapped key must be a multiple of 8 bytes and >= 24, got {}",
            wrapped.len()
        )));
    }

    let kek = Kek::from(*kek);
    let mut material = Zeroizing::new(vec![0u8; wrapped.len() - KW_OVERHEAD]);
    kek.unwrap(wrapped, &mut material)
        .map_err(|_| CryptoError::AuthenticationFailed)?;
    Ok(material)
}
