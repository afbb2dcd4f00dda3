//! The document store facade.
//!
//! Orchestrates create/read/update/delete/find over a
//! [`DocumentTransport`], owns the index-set policy, and mediates
//! master-key acquisition: operations first consult the [`KeyCache`]
//! (a hit restarts the sliding TTL) and fall back to the registered
//! [`MasterKeyListener`], which is expected to produce an unlocked key —
//! typically by asking the user for their password.

use crate::codec;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::key_cache::KeyCache;
use crate::query::{self, Filter};
use crate::transport::{DocumentTransport, HttpTransport};
use crate::types::EncryptedDocument;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;
use veilstore_crypto::MasterKey;

/// A request for an unlocked master key, dispatched when an operation
/// needs the key and the cache is empty.
#[derive(Clone, Debug)]
pub struct MasterKeyRequest {
    pub account_id: String,
}

impl MasterKeyRequest {
    pub fn name(&self) -> &'static str {
        "MasterKeyRequest"
    }
}

/// The listener's answer: the unlocked key, and optionally how long to
/// cache it (the store default applies otherwise).
pub struct MasterKeyResponse {
    pub master_key: MasterKey,
    pub timeout: Option<Duration>,
}

/// Receives [`MasterKeyRequest`]s. At most one listener is registered
/// per store.
#[async_trait::async_trait]
pub trait MasterKeyListener: Send + Sync {
    async fn on_master_key_request(
        &self,
        request: MasterKeyRequest,
    ) -> StoreResult<MasterKeyResponse>;
}

/// Client-side encrypted document store for one account.
pub struct DocumentStore {
    account_id: String,
    transport: Arc<dyn DocumentTransport>,
    index_set: Mutex<HashSet<String>>,
    key_cache: KeyCache,
    listener: Mutex<Option<Arc<dyn MasterKeyListener>>>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Create a store over an arbitrary transport.
    pub fn new(
        account_id: impl Into<String>,
        transport: Arc<dyn DocumentTransport>,
        config: &StoreConfig,
    ) -> StoreResult<Self> {
        let account_id = account_id.into();
        if account_id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "account id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            account_id,
            transport,
            index_set: Mutex::new(HashSet::new()),
            key_cache: KeyCache::new(Duration::from_millis(config.key_cache_ttl_ms)),
            listener: Mutex::new(None),
        })
    }

    /// Create a store talking HTTP to the configured server.
    pub fn with_http_transport(
        account_id: impl Into<String>,
        config: &StoreConfig,
    ) -> StoreResult<Self> {
        let account_id = account_id.into();
        let transport = Arc::new(HttpTransport::new(config, &account_id)?);
        Self::new(account_id, transport, config)
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Mark an attribute as indexable. Future writes emit a blinded
    /// index entry for it; records already on the server are not
    /// retrofitted.
    pub fn ensure_index(&self, attribute: impl Into<String>) {
        self.index_set.lock().unwrap().insert(attribute.into());
    }

    /// Register the listener that supplies the master key on demand.
    /// A second registration is rejected while one is set.
    pub fn on_master_key_request(
        &self,
        listener: Arc<dyn MasterKeyListener>,
    ) -> StoreResult<()> {
        let mut slot = self.listener.lock().unwrap();
        if slot.is_some() {
            return Err(StoreError::InvalidArgument(
                "a master key listener is already registered".to_string(),
            ));
        }
        *slot = Some(listener);
        Ok(())
    }

    /// Remove the registered listener, if any.
    pub fn clear_master_key_listener(&self) {
        *self.listener.lock().unwrap() = None;
    }

    /// Drop the cached master key immediately. The next operation that
    /// needs it will go back through the listener.
    pub async fn lock(&self) {
        self.key_cache.clear().await;
    }

    /// Generate a fresh master key, wrap it under `password`, and store
    /// it on the server — only if the account has none yet. The new key
    /// is cached on success.
    pub async fn create_master_key(&self, password: &str) -> StoreResult<()> {
        let master_key = MasterKey::generate();
        let wrapped = master_key.wrap_with_password(password)?;
        self.transport.put_master_key_if_absent(&wrapped).await?;
        debug!(account_id = %self.account_id, "created master key");
        self.key_cache.update(master_key, None).await;
        Ok(())
    }

    /// Re-wrap the current master key under a new password and replace
    /// the stored copy. Unlocks through the listener if the key is not
    /// cached.
    pub async fn change_master_key_password(&self, new_password: &str) -> StoreResult<()> {
        let master_key = self.acquire_master_key().await?;
        let wrapped = master_key.wrap_with_password(new_password)?;
        self.transport.post_master_key(&wrapped).await?;
        debug!(account_id = %self.account_id, "master key password changed");
        Ok(())
    }

    /// Fetch the stored wrapped master key and unwrap it with `password`.
    ///
    /// The result is returned to the caller but not cached; caching
    /// happens through [`create_master_key`](Self::create_master_key)
    /// and the listener path.
    pub async fn get_master_key(&self, password: &str) -> StoreResult<MasterKey> {
        let wrapped = self.transport.get_master_key().await?;
        Ok(MasterKey::unwrap_with_password(password, &wrapped)?)
    }

    /// Create a document. Fails with [`StoreError::Duplicate`] if a
    /// document with the same id already exists.
    pub async fn insert(&self, document: &Value) -> StoreResult<()> {
        let master_key = self.acquire_master_key().await?;
        let encrypted = codec::encode(document, &master_key, &self.index_snapshot())?;
        self.transport.insert_document(&encrypted).await
    }

    /// Create or replace a document, returning the record as stored.
    pub async fn update(&self, document: &Value) -> StoreResult<EncryptedDocument> {
        let master_key = self.acquire_master_key().await?;
        let encrypted = codec::encode(document, &master_key, &self.index_snapshot())?;
        self.transport.put_document(&encrypted.id, &encrypted).await?;
        Ok(encrypted)
    }

    /// Delete the document with the given cleartext id. Returns `false`
    /// when no such document existed.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let master_key = self.acquire_master_key().await?;
        self.transport.delete_document(&master_key.blind(id)).await
    }

    /// Fetch and decrypt the document with the given cleartext id.
    pub async fn get(&self, id: &str) -> StoreResult<Value> {
        let master_key = self.acquire_master_key().await?;
        let encrypted = self.transport.get_document(&master_key.blind(id)).await?;
        codec::decode(&encrypted, &master_key)
    }

    /// Run an equality or presence query and decrypt the result set.
    /// A single failed decrypt fails the whole call.
    pub async fn find(&self, filter: &Filter) -> StoreResult<Vec<Value>> {
        let master_key = self.acquire_master_key().await?;
        let blinded = query::plan(filter, &master_key)?;
        let results = self.transport.query(&blinded).await?;
        results
            .iter()
            .map(|encrypted| codec::decode(encrypted, &master_key))
            .collect()
    }

    fn index_snapshot(&self) -> HashSet<String> {
        self.index_set.lock().unwrap().clone()
    }

    /// Cache hit → sliding TTL restarts and the key is returned. Miss →
    /// the registered listener is asked; its key is cached with the
    /// timeout it chose (or the store default). No listener → the key is
    /// simply not available.
    async fn acquire_master_key(&self) -> StoreResult<MasterKey> {
        if let Some(master_key) = self.key_cache.get().await {
            return Ok(master_key);
        }

        let listener = self.listener.lock().unwrap().clone();
        let Some(listener) = listener else {
            return Err(StoreError::NotFound("Master key not found.".to_string()));
        };

        debug!(account_id = %self.account_id, "requesting master key from listener");
        let response = listener
            .on_master_key_request(MasterKeyRequest {
                account_id: self.account_id.clone(),
            })
            .await?;

        self.key_cache
            .update(response.master_key.clone(), response.timeout)
            .await;
        Ok(response.master_key)
    }
}
