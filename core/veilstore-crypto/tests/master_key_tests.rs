use pretty_assertions::assert_eq;
use serde_json::json;
use veilstore_crypto::base64url::{base64url_decode, base64url_encode};
use veilstore_crypto::{CryptoError, DocumentJwe, MasterKey};

// --- envelope encryption ---

#[test]
fn encrypt_decrypt_round_trip() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"attack at dawn").unwrap();
    assert_eq!(key.decrypt(&jwe).unwrap(), b"attack at dawn");
}

#[test]
fn encrypt_object_round_trip() {
    let key = MasterKey::generate();
    let document = json!({ "id": "doc-1", "title": "notes", "count": 3 });
    let jwe = key.encrypt_object(&document).unwrap();
    let recovered: serde_json::Value = key.decrypt_object(&jwe).unwrap();
    assert_eq!(recovered, document);
}

#[test]
fn envelope_carries_expected_header() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"x").unwrap();
    assert_eq!(jwe.unprotected.alg, "A256KW");
    assert_eq!(jwe.unprotected.enc, "A256GCM");
}

#[test]
fn envelope_field_lengths() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"four").unwrap();
    assert_eq!(base64url_decode(&jwe.iv).unwrap().len(), 12);
    assert_eq!(base64url_decode(&jwe.tag).unwrap().len(), 16);
    // 32-byte content key + 8 bytes AES-KW overhead
    assert_eq!(base64url_decode(&jwe.encrypted_key).unwrap().len(), 40);
    assert_eq!(base64url_decode(&jwe.ciphertext).unwrap().len(), 4);
}

#[test]
fn repeated_encryption_is_randomized() {
    let key = MasterKey::generate();
    let a = key.encrypt(b"same plaintext").unwrap();
    let b = key.encrypt(b"same plaintext").unwrap();
    assert_ne!(a.iv, b.iv);
    assert_ne!(a.encrypted_key, b.encrypted_key);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let jwe = MasterKey::generate().encrypt(b"secret").unwrap();
    assert!(matches!(
        MasterKey::generate().decrypt(&jwe).unwrap_err(),
        CryptoError::AuthenticationFailed
    ));
}

fn flip_first_byte(encoded: &str) -> String {
    let mut bytes = base64url_decode(encoded).unwrap();
    bytes[0] ^= 0xff;
    base64url_encode(&bytes)
}

#[test]
fn tampered_ciphertext_fails() {
    let key = MasterKey::generate();
    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.ciphertext = flip_first_byte(&jwe.ciphertext);
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::AuthenticationFailed
    ));
}

#[test]
fn tampered_iv_fails() {
    let key = MasterKey::generate();
    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.iv = flip_first_byte(&jwe.iv);
    assert!(key.decrypt(&jwe).is_err());
}

#[test]
fn tampered_tag_fails() {
    let key = MasterKey::generate();
    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.tag = flip_first_byte(&jwe.tag);
    assert!(key.decrypt(&jwe).is_err());
}

#[test]
fn tampered_encrypted_key_fails() {
    let key = MasterKey::generate();
    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.encrypted_key = flip_first_byte(&jwe.encrypted_key);
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::AuthenticationFailed
    ));
}

#[test]
fn rejects_unknown_algorithms() {
    let key = MasterKey::generate();
    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.unprotected.alg = "RSA-OAEP".to_string();
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::Format(_)
    ));

    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.unprotected.enc = "A128GCM".to_string();
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::Format(_)
    ));
}

#[test]
fn rejects_misshaped_fields() {
    let key = MasterKey::generate();

    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.iv = base64url_encode(&[0u8; 8]);
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::Format(_)
    ));

    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.tag = base64url_encode(&[0u8; 8]);
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::Format(_)
    ));

    let mut jwe = key.encrypt(b"secret").unwrap();
    jwe.encrypted_key = "не base64".to_string();
    assert!(matches!(
        key.decrypt(&jwe).unwrap_err(),
        CryptoError::Format(_)
    ));
}

#[test]
fn decrypt_object_rejects_non_json_body() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"\xff\xfe not json").unwrap();
    let result: Result<serde_json::Value, _> = key.decrypt_object(&jwe);
    assert!(matches!(result.unwrap_err(), CryptoError::Format(_)));
}

// --- blinding ---

#[test]
fn blinding_is_deterministic() {
    let key = MasterKey::generate();
    assert_eq!(key.blind("customerNumber"), key.blind("customerNumber"));
    assert_eq!(key.blind(b"bytes".as_slice()), key.blind("bytes"));
}

#[test]
fn blinding_separates_inputs_and_keys() {
    let key = MasterKey::generate();
    assert_ne!(key.blind("a"), key.blind("b"));
    assert_ne!(MasterKey::generate().blind("a"), MasterKey::generate().blind("a"));
}

#[test]
fn blinded_tokens_are_32_byte_macs() {
    let key = MasterKey::generate();
    assert_eq!(base64url_decode(&key.blind("anything")).unwrap().len(), 32);
}

#[test]
fn blinding_differs_from_encryption_key_domain() {
    // The blinding subkey must not be usable to unwrap envelopes: a token
    // of the blinded form never matches any envelope field.
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"data").unwrap();
    assert_ne!(key.blind("data"), jwe.ciphertext);
}

// --- password wrapping ---

#[test]
fn password_wrap_header_shape() {
    let key = MasterKey::generate();
    let wrapped = key.wrap_with_password("hunter2").unwrap();
    assert_eq!(wrapped.header.alg, "PBES2-HS512+A256KW");
    assert_eq!(wrapped.header.p2c, 4096);
    assert_eq!(base64url_decode(&wrapped.header.p2s).unwrap().len(), 32);
    // 32-byte master secret + 8 bytes AES-KW overhead
    assert_eq!(base64url_decode(&wrapped.encrypted_key).unwrap().len(), 40);
}

#[test]
fn password_round_trip_preserves_the_hierarchy() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"written before the wrap").unwrap();
    let token = key.blind("indexedKey");

    let wrapped = key.wrap_with_password("hunter2").unwrap();
    let recovered = MasterKey::unwrap_with_password("hunter2", &wrapped).unwrap();

    assert_eq!(recovered.decrypt(&jwe).unwrap(), b"written before the wrap");
    assert_eq!(recovered.blind("indexedKey"), token);
}

#[test]
fn wrong_password_fails() {
    let wrapped = MasterKey::generate().wrap_with_password("hunter2").unwrap();
    assert!(matches!(
        MasterKey::unwrap_with_password("*******", &wrapped).unwrap_err(),
        CryptoError::AuthenticationFailed
    ));
}

#[test]
fn each_wrap_uses_a_fresh_salt() {
    let key = MasterKey::generate();
    let a = key.wrap_with_password("hunter2").unwrap();
    let b = key.wrap_with_password("hunter2").unwrap();
    assert_ne!(a.header.p2s, b.header.p2s);
    assert_ne!(a.encrypted_key, b.encrypted_key);
}

#[test]
fn unwrap_rejects_bad_headers() {
    let key = MasterKey::generate();

    let mut wrapped = key.wrap_with_password("pw").unwrap();
    wrapped.header.alg = "PBES2-HS256+A128KW".to_string();
    assert!(matches!(
        MasterKey::unwrap_with_password("pw", &wrapped).unwrap_err(),
        CryptoError::Format(_)
    ));

    let mut wrapped = key.wrap_with_password("pw").unwrap();
    wrapped.header.p2c = 0;
    assert!(matches!(
        MasterKey::unwrap_with_password("pw", &wrapped).unwrap_err(),
        CryptoError::Format(_)
    ));

    let mut wrapped = key.wrap_with_password("pw").unwrap();
    wrapped.header.p2s = "%%%".to_string();
    assert!(matches!(
        MasterKey::unwrap_with_password("pw", &wrapped).unwrap_err(),
        CryptoError::Format(_)
    ));
}

#[test]
fn unwrap_accepts_any_positive_iteration_count() {
    // Keys wrapped by older or foreign clients may use other counts.
    // Build a wrap by hand at p2c = 1000 from the public primitives.
    use veilstore_crypto::jwe::Pbes2Header;
    use veilstore_crypto::{kdf, keywrap, WrappedMasterKey};

    let secret = kdf::random_array::<32>();
    let salt = kdf::random_array::<32>();
    let wrap_key = kdf::pbkdf2_sha512(b"pw", &salt, 1000);
    let wrapped = WrappedMasterKey {
        header: Pbes2Header {
            alg: "PBES2-HS512+A256KW".to_string(),
            p2c: 1000,
            p2s: base64url_encode(&salt),
        },
        encrypted_key: base64url_encode(&keywrap::wrap(&wrap_key, &secret).unwrap()),
    };

    let recovered = MasterKey::unwrap_with_password("pw", &wrapped).unwrap();
    let jwe = recovered.encrypt(b"body").unwrap();
    assert_eq!(recovered.decrypt(&jwe).unwrap(), b"body");
}

#[test]
fn tampered_wrapped_secret_fails() {
    let key = MasterKey::generate();
    let mut wrapped = key.wrap_with_password("pw").unwrap();
    let mut bytes = base64url_decode(&wrapped.encrypted_key).unwrap();
    bytes[0] ^= 0xff;
    wrapped.encrypted_key = base64url_encode(&bytes);
    assert!(matches!(
        MasterKey::unwrap_with_password("pw", &wrapped).unwrap_err(),
        CryptoError::AuthenticationFailed
    ));
}

// --- wire shape ---

#[test]
fn document_jwe_serializes_with_wire_field_names() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"x").unwrap();
    let value = serde_json::to_value(&jwe).unwrap();
    assert_eq!(value["unprotected"]["alg"], "A256KW");
    assert_eq!(value["unprotected"]["enc"], "A256GCM");
    assert!(value["encrypted_key"].is_string());
    assert!(value["iv"].is_string());
    assert!(value["ciphertext"].is_string());
    assert!(value["tag"].is_string());
}

#[test]
fn document_jwe_json_round_trip() {
    let key = MasterKey::generate();
    let jwe = key.encrypt(b"round trip").unwrap();
    let json = serde_json::to_string(&jwe).unwrap();
    let parsed: DocumentJwe = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, jwe);
    assert_eq!(key.decrypt(&parsed).unwrap(), b"round trip");
}

#[test]
fn wrapped_master_key_json_round_trip() {
    let key = MasterKey::generate();
    let wrapped = key.wrap_with_password("hunter2").unwrap();
    let json = serde_json::to_string(&wrapped).unwrap();
    let parsed: veilstore_crypto::WrappedMasterKey = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, wrapped);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["header"]["alg"], "PBES2-HS512+A256KW");
    assert_eq!(value["header"]["p2c"], 4096);
    assert!(value["header"]["p2s"].is_string());
    assert!(value["encrypted_key"].is_string());
}

#[test]
fn debug_output_redacts_secrets() {
    let key = MasterKey::generate();
    let debug = format!("{key:?}");
    assert!(debug.contains("REDACTED"));
}
