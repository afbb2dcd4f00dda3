//! Client for a server-side document store that never sees plaintext.
//!
//! Documents are encrypted end-to-end before leaving the process:
//! - bodies travel as AES-KW / AES-GCM envelopes with per-document
//!   content keys,
//! - identifiers and indexable attributes travel as deterministic HMAC
//!   tokens, so the server can still answer equality and presence
//!   queries,
//! - the master key itself is stored server-side wrapped under the
//!   user's password, and held in memory only behind a sliding TTL.
//!
//! [`DocumentStore`] is the entry point; [`DocumentTransport`] is the
//! seam to the remote server.

pub mod codec;
pub mod config;
pub mod error;
pub mod key_cache;
pub mod query;
pub mod store;
pub mod transport;
pub mod types;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use key_cache::KeyCache;
pub use query::{EqualsFilter, Filter, HasFilter};
pub use store::{DocumentStore, MasterKeyListener, MasterKeyRequest, MasterKeyResponse};
pub use transport::{DocumentTransport, HttpTransport};
pub use types::{BlindedAttribute, BlindedQuery, EncryptedDocument};
