//! Server-visible wire types.
//!
//! Everything here is opaque to the server: document bodies travel as JWE
//! envelopes, identifiers and indexed attributes as deterministic HMAC
//! tokens.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use veilstore_crypto::DocumentJwe;

/// One blinded index entry: an HMAC of the attribute name paired with an
/// HMAC of the single-entry JSON form of the attribute.
///
/// Identical (name, value) pairs blind to identical tokens across
/// documents, which is what lets the server answer equality queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedAttribute {
    pub name: String,
    pub value: String,
}

/// The record the server stores: blinded id, blinded index entries for
/// the indexable attributes, and the encrypted body.
///
/// Attribute order carries no meaning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDocument {
    pub id: String,
    #[serde(default)]
    pub attributes: Vec<BlindedAttribute>,
    pub jwe: DocumentJwe,
}

/// A fully blinded query, ready to send to the server.
///
/// `equals` maps are OR-ed; pairs within one map are AND-ed. `has` names
/// are AND-ed. `BTreeMap` keeps the serialized form stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equals: Option<Vec<BTreeMap<String, String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<Vec<String>>,
}
