//! Store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a document store client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the storage server (e.g., "https://api.veilstore.io").
    pub api_base_url: String,

    /// Path prefix of the document-store API on that server.
    pub storage_prefix: String,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long an unlocked master key stays cached in memory, in
    /// milliseconds. Every cache hit restarts the countdown.
    pub key_cache_ttl_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.veilstore.io".to_string(),
            storage_prefix: "/private-storage".to_string(),
            request_timeout_secs: 30,
            key_cache_ttl_ms: 60_000,
        }
    }
}

impl StoreConfig {
    /// Creates a config pointing at a given server, keeping the other
    /// defaults. Handy for tests against a local mock.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }
}
