//! Filter validation and translation into blinded server queries.
//!
//! A filter carries exactly one of:
//! - `equals` — an object (or list of objects) of attribute/value pairs.
//!   Pairs within one object must all match (AND); objects in a list are
//!   alternatives (OR).
//! - `has` — an attribute name (or list of names) that must all be
//!   present (AND).
//!
//! Translation blinds names and the single-entry JSON form of each pair,
//! matching what the codec emitted at write time. Results are never
//! re-filtered client-side; the server is trusted to honor the filter.

use crate::codec::blind_attribute;
use crate::error::{StoreError, StoreResult};
use crate::types::BlindedQuery;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use veilstore_crypto::MasterKey;

/// Caller-facing filter for `find`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equals: Option<EqualsFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has: Option<HasFilter>,
}

impl Filter {
    /// Filter on attribute/value equality.
    pub fn equals(value: impl Into<EqualsFilter>) -> Self {
        Self {
            equals: Some(value.into()),
            has: None,
        }
    }

    /// Filter on attribute presence.
    pub fn has(value: impl Into<HasFilter>) -> Self {
        Self {
            equals: None,
            has: Some(value.into()),
        }
    }
}

/// One object, or a list of alternative objects.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EqualsFilter {
    One(Map<String, Value>),
    Many(Vec<Map<String, Value>>),
}

impl From<Map<String, Value>> for EqualsFilter {
    fn from(map: Map<String, Value>) -> Self {
        EqualsFilter::One(map)
    }
}

impl From<Vec<Map<String, Value>>> for EqualsFilter {
    fn from(maps: Vec<Map<String, Value>>) -> Self {
        EqualsFilter::Many(maps)
    }
}

/// One attribute name, or a list of required names.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HasFilter {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for HasFilter {
    fn from(name: &str) -> Self {
        HasFilter::One(name.to_string())
    }
}

impl From<String> for HasFilter {
    fn from(name: String) -> Self {
        HasFilter::One(name)
    }
}

impl From<Vec<String>> for HasFilter {
    fn from(names: Vec<String>) -> Self {
        HasFilter::Many(names)
    }
}

/// Validate a filter and translate it into its blinded form.
pub fn plan(filter: &Filter, master_key: &MasterKey) -> StoreResult<BlindedQuery> {
    match (&filter.equals, &filter.has) {
        (Some(_), Some(_)) => Err(StoreError::InvalidArgument(
            "filter must specify either `equals` or `has`, not both".to_string(),
        )),
        (None, None) => Err(StoreError::InvalidArgument(
            "filter must specify one of `equals` or `has`".to_string(),
        )),
        (Some(equals), None) => plan_equals(equals, master_key),
        (None, Some(has)) => plan_has(has, master_key),
    }
}

fn plan_equals(equals: &EqualsFilter, master_key: &MasterKey) -> StoreResult<BlindedQuery> {
    let alternatives: Vec<&Map<String, Value>> = match equals {
        EqualsFilter::One(map) => vec![map],
        EqualsFilter::Many(maps) => maps.iter().collect(),
    };
    if alternatives.is_empty() {
        return Err(StoreError::InvalidArgument(
            "`equals` must contain at least one object".to_string(),
        ));
    }

    let mut blinded = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        if alternative.is_empty() {
            return Err(StoreError::InvalidArgument(
                "`equals` objects must not be empty".to_string(),
            ));
        }
        let pairs: BTreeMap<String, String> = alternative
            .iter()
            .map(|(key, value)| {
                (
                    master_key.blind(key),
                    blind_attribute(master_key, key, value),
                )
            })
            .collect();
        blinded.push(pairs);
    }

    Ok(BlindedQuery {
        equals: Some(blinded),
        has: None,
    })
}

fn plan_has(has: &HasFilter, master_key: &MasterKey) -> StoreResult<BlindedQuery> {
    let names: Vec<&str> = match has {
        HasFilter::One(name) => vec![name.as_str()],
        HasFilter::Many(names) => names.iter().map(String::as_str).collect(),
    };
    if names.is_empty() {
        return Err(StoreError::InvalidArgument(
            "`has` must contain at least one attribute name".to_string(),
        ));
    }
    if names.iter().any(|name| name.is_empty()) {
        return Err(StoreError::InvalidArgument(
            "attribute names must not be empty".to_string(),
        ));
    }

    Ok(BlindedQuery {
        equals: None,
        has: Some(names.into_iter().map(|name| master_key.blind(name)).collect()),
    })
}
