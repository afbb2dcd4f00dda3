//! Conversion between cleartext documents and encrypted records.
//!
//! A cleartext document is any JSON object with a non-empty string `id`.
//! Encoding blinds the id, emits one blinded attribute per indexable key
//! present on the document, and encrypts the entire object (id included)
//! as the envelope body. The blinded outer id never reaches callers on
//! the way back; decode returns the original cleartext object.

use crate::error::{StoreError, StoreResult};
use crate::types::{BlindedAttribute, EncryptedDocument};
use serde_json::{Map, Value};
use std::collections::HashSet;
use veilstore_crypto::MasterKey;

/// Validate a cleartext document and return its id.
pub fn document_id(document: &Value) -> StoreResult<&str> {
    let object = document
        .as_object()
        .ok_or_else(|| StoreError::InvalidArgument("document must be a JSON object".to_string()))?;
    let id = object
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidArgument("document id must be a string".to_string()))?;
    if id.is_empty() {
        return Err(StoreError::InvalidArgument(
            "document id must not be empty".to_string(),
        ));
    }
    Ok(id)
}

/// Blind an attribute value through its single-entry JSON object form,
/// so `{"k": v}` and not the bare value is what gets tokenized.
pub fn blind_attribute(master_key: &MasterKey, key: &str, value: &Value) -> String {
    let mut single = Map::with_capacity(1);
    single.insert(key.to_string(), value.clone());
    let payload =
        serde_json::to_string(&Value::Object(single)).expect("JSON values always serialize");
    master_key.blind(payload)
}

/// Encode a cleartext document into the record the server stores.
pub fn encode(
    document: &Value,
    master_key: &MasterKey,
    index_set: &HashSet<String>,
) -> StoreResult<EncryptedDocument> {
    let id = document_id(document)?;
    let object = document.as_object().expect("validated as object above");

    let attributes = object
        .iter()
        .filter(|(key, _)| index_set.contains(key.as_str()))
        .map(|(key, value)| BlindedAttribute {
            name: master_key.blind(key),
            value: blind_attribute(master_key, key, value),
        })
        .collect();

    Ok(EncryptedDocument {
        id: master_key.blind(id),
        attributes,
        jwe: master_key.encrypt_object(document)?,
    })
}

/// Decode an encrypted record back to the cleartext document.
pub fn decode(encrypted: &EncryptedDocument, master_key: &MasterKey) -> StoreResult<Value> {
    if encrypted.id.is_empty() {
        return Err(StoreError::Format(
            "encrypted document has an empty id".to_string(),
        ));
    }

    let document: Value = master_key.decrypt_object(&encrypted.jwe)?;
    match document.as_object().and_then(|o| o.get("id")) {
        Some(Value::String(id)) if !id.is_empty() => Ok(document),
        _ => Err(StoreError::Format(
            "decrypted document has no string id".to_string(),
        )),
    }
}
