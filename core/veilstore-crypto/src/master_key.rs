//! The master key and its derived hierarchy.
//!
//! A master key owns three secrets:
//!
//! 1. **master** — a random 32-byte HMAC-SHA-256 secret, the derivation
//!    root. It leaves the process only inside a [`WrappedMasterKey`].
//! 2. **kek** — AES-KW key-encryption key, `HMAC-SHA-256(master, "kek")`.
//!    Wraps the fresh content key of every document envelope.
//! 3. **index_hmac** — blinding key, `HMAC-SHA-256(master, "hmac")`.
//!    Produces the deterministic tokens the server matches on.
//!
//! Two separate subkeys are kept because the two jobs have incompatible
//! requirements: envelope encryption must be randomized (fresh iv and
//! content key per call), blinding must be deterministic. The label set
//! {"kek", "hmac"} is closed; changing it breaks every stored envelope.

use crate::base64url::{base64url_encode, decode_field};
use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::jwe::{
    DocumentJwe, JweHeader, Pbes2Header, WrappedMasterKey, PASSWORD_ALG, PBES2_ITERATIONS,
    PBES2_SALT_LEN,
};
use crate::kdf;
use crate::keywrap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

const KEK_LABEL: &[u8] = b"kek";
const INDEX_LABEL: &[u8] = b"hmac";

/// Root of the key hierarchy. Cheap to clone; all secrets zeroize on drop.
#[derive(Clone)]
pub struct MasterKey {
    master: Zeroizing<[u8; 32]>,
    kek: Zeroizing<[u8; 32]>,
    index_hmac: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("master", &"[REDACTED]")
            .finish()
    }
}

impl MasterKey {
    /// Generate a fresh master key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self::from_master_secret(Zeroizing::new(kdf::random_array::<32>()))
    }

    fn from_master_secret(master: Zeroizing<[u8; 32]>) -> Self {
        let kek = Zeroizing::new(kdf::hmac_sha256(&*master, KEK_LABEL));
        let index_hmac = Zeroizing::new(kdf::hmac_sha256(&*master, INDEX_LABEL));
        Self {
            master,
            kek,
            index_hmac,
        }
    }

    /// Encrypt raw bytes into a document envelope.
    ///
    /// A fresh 32-byte content key is generated per call, wrapped under
    /// the KEK, and used once with a fresh 12-byte iv.
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<DocumentJwe> {
        let cek = Zeroizing::new(kdf::random_array::<32>());
        let wrapped_cek = keywrap::wrap(&self.kek, &*cek)?;
        let iv = kdf::random_array::<{ cipher::IV_LEN }>();
        let (ciphertext, tag) = cipher::encrypt(&cek, &iv, plaintext)?;

        Ok(DocumentJwe {
            unprotected: JweHeader::default(),
            encrypted_key: base64url_encode(&wrapped_cek),
            iv: base64url_encode(&iv),
            ciphertext: base64url_encode(&ciphertext),
            tag: base64url_encode(&tag),
        })
    }

    /// Serialize `value` as JSON and encrypt it.
    pub fn encrypt_object<T: Serialize>(&self, value: &T) -> CryptoResult<DocumentJwe> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(value).map_err(|e| CryptoError::Format(e.to_string()))?,
        );
        self.encrypt(&plaintext)
    }

    /// Decrypt a document envelope back to its plaintext bytes.
    pub fn decrypt(&self, jwe: &DocumentJwe) -> CryptoResult<Vec<u8>> {
        jwe.validate_header()?;

        let wrapped_cek = decode_field(&jwe.encrypted_key, "encrypted_key")?;
        let iv: [u8; cipher::IV_LEN] = decode_field(&jwe.iv, "iv")?
            .try_into()
            .map_err(|_| CryptoError::Format("iv must be 12 bytes".to_string()))?;
        let ciphertext = decode_field(&jwe.ciphertext, "ciphertext")?;
        let tag: [u8; cipher::TAG_LEN] = decode_field(&jwe.tag, "tag")?
            .try_into()
            .map_err(|_| CryptoError::Format("tag must be 16 bytes".to_string()))?;

        let cek_raw = keywrap::unwrap(&self.kek, &wrapped_cek)?;
        let cek: Zeroizing<[u8; 32]> = Zeroizing::new(
            <[u8; 32]>::try_from(cek_raw.as_slice())
                .map_err(|_| CryptoError::Format("content key must be 32 bytes".to_string()))?,
        );

        cipher::decrypt(&cek, &iv, &ciphertext, &tag)
    }

    /// Decrypt a document envelope and parse the plaintext as JSON.
    pub fn decrypt_object<T: DeserializeOwned>(&self, jwe: &DocumentJwe) -> CryptoResult<T> {
        let plaintext = Zeroizing::new(self.decrypt(jwe)?);
        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Format(e.to_string()))
    }

    /// Deterministically blind `data` into an opaque index token.
    ///
    /// Identical inputs under the same key always produce the same token;
    /// the server matches tokens for equality without learning plaintext.
    pub fn blind(&self, data: impl AsRef<[u8]>) -> String {
        base64url_encode(&kdf::hmac_sha256(&*self.index_hmac, data.as_ref()))
    }

    /// Wrap the master secret under a password for remote storage.
    pub fn wrap_with_password(&self, password: &str) -> CryptoResult<WrappedMasterKey> {
        let password_bytes = Zeroizing::new(password.as_bytes().to_vec());
        let salt = kdf::random_array::<PBES2_SALT_LEN>();
        let wrap_key = kdf::pbkdf2_sha512(&password_bytes, &salt, PBES2_ITERATIONS);
        let wrapped = keywrap::wrap(&wrap_key, &*self.master)?;

        Ok(WrappedMasterKey {
            header: Pbes2Header {
                alg: PASSWORD_ALG.to_string(),
                p2c: PBES2_ITERATIONS,
                p2s: base64url_encode(&salt),
            },
            encrypted_key: base64url_encode(&wrapped),
        })
    }

    /// Recover a master key from its password-wrapped form.
    ///
    /// A wrong password surfaces as [`CryptoError::AuthenticationFailed`]
    /// via the key-wrap integrity check; header defects as
    /// [`CryptoError::Format`].
    pub fn unwrap_with_password(
        password: &str,
        wrapped: &WrappedMasterKey,
    ) -> CryptoResult<MasterKey> {
        wrapped.validate_header()?;

        let salt = decode_field(&wrapped.header.p2s, "p2s")?;
        let wrapped_secret = decode_field(&wrapped.encrypted_key, "encrypted_key")?;

        let password_bytes = Zeroizing::new(password.as_bytes().to_vec());
        let wrap_key = kdf::pbkdf2_sha512(&password_bytes, &salt, wrapped.header.p2c);
        let secret_raw = keywrap::unwrap(&wrap_key, &wrapped_secret)?;
        let master: Zeroizing<[u8; 32]> = Zeroizing::new(
            <[u8; 32]>::try_from(secret_raw.as_slice())
                .map_err(|_| CryptoError::Format("master secret must be 32 bytes".to_string()))?,
        );

        Ok(Self::from_master_secret(master))
    }
}
