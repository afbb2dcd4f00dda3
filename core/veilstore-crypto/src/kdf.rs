//! Key derivation and randomness.
//!
//! `hmac_sha256` — one-shot MAC, used both for subkey derivation from the
//!   master secret and for deterministic index blinding.
//!
//! `pbkdf2_sha512` — derives the 32-byte password-wrap key
//!   (PBES2-HS512+A256KW).

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA-256 over `data`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA-256 accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Derive a 32-byte key from a password with PBKDF2-HMAC-SHA-512.
///
/// The salt should be fresh per wrap and stored alongside the wrapped key
/// (it is not secret). The output is zeroized on drop.
pub fn pbkdf2_sha512(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut *key);
    key
}

/// Fill a fixed-size array from the OS CSPRNG.
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}
