//! Shared test helpers: an in-memory document server and canned
//! master-key listeners.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use veilstore_client::{
    BlindedQuery, DocumentStore, DocumentTransport, EncryptedDocument, MasterKeyListener,
    MasterKeyRequest, MasterKeyResponse, StoreConfig, StoreError, StoreResult,
};
use veilstore_crypto::{MasterKey, WrappedMasterKey};

/// In-memory stand-in for the remote document server, faithful to the
/// wire semantics: only-if-absent master-key creation, conflict on
/// duplicate insert, equality/presence matching over blinded tokens.
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<ServerState>,
}

#[derive(Default)]
struct ServerState {
    master_key: Option<WrappedMasterKey>,
    documents: HashMap<String, EncryptedDocument>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn stored_document(&self, blinded_id: &str) -> Option<EncryptedDocument> {
        self.state.lock().unwrap().documents.get(blinded_id).cloned()
    }
}

#[async_trait]
impl DocumentTransport for MemoryTransport {
    async fn put_master_key_if_absent(&self, wrapped: &WrappedMasterKey) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.master_key.is_some() {
            return Err(StoreError::Duplicate(
                "master key already exists".to_string(),
            ));
        }
        state.master_key = Some(wrapped.clone());
        Ok(())
    }

    async fn post_master_key(&self, wrapped: &WrappedMasterKey) -> StoreResult<()> {
        self.state.lock().unwrap().master_key = Some(wrapped.clone());
        Ok(())
    }

    async fn get_master_key(&self) -> StoreResult<WrappedMasterKey> {
        self.state
            .lock()
            .unwrap()
            .master_key
            .clone()
            .ok_or_else(|| StoreError::NotFound("master key not found".to_string()))
    }

    async fn insert_document(&self, document: &EncryptedDocument) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.documents.contains_key(&document.id) {
            return Err(StoreError::Duplicate("document already exists".to_string()));
        }
        state.documents.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn put_document(
        &self,
        blinded_id: &str,
        document: &EncryptedDocument,
    ) -> StoreResult<()> {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(blinded_id.to_string(), document.clone());
        Ok(())
    }

    async fn get_document(&self, blinded_id: &str) -> StoreResult<EncryptedDocument> {
        self.state
            .lock()
            .unwrap()
            .documents
            .get(blinded_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("no document with id {blinded_id}")))
    }

    async fn delete_document(&self, blinded_id: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .remove(blinded_id)
            .is_some())
    }

    async fn query(&self, query: &BlindedQuery) -> StoreResult<Vec<EncryptedDocument>> {
        let state = self.state.lock().unwrap();
        let matches = state
            .documents
            .values()
            .filter(|doc| {
                if let Some(alternatives) = &query.equals {
                    alternatives.iter().any(|pairs| {
                        pairs.iter().all(|(name, value)| {
                            doc.attributes
                                .iter()
                                .any(|attr| attr.name == *name && attr.value == *value)
                        })
                    })
                } else if let Some(names) = &query.has {
                    names
                        .iter()
                        .all(|name| doc.attributes.iter().any(|attr| attr.name == *name))
                } else {
                    false
                }
            })
            .cloned()
            .collect();
        Ok(matches)
    }
}

/// Listener that hands out a fixed key, counting how often it is asked.
pub struct StaticKeyListener {
    master_key: MasterKey,
    timeout: Option<Duration>,
    requests: AtomicUsize,
}

impl StaticKeyListener {
    pub fn new(master_key: MasterKey) -> Arc<Self> {
        Arc::new(Self {
            master_key,
            timeout: None,
            requests: AtomicUsize::new(0),
        })
    }

    pub fn with_timeout(master_key: MasterKey, timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            master_key,
            timeout: Some(timeout),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MasterKeyListener for StaticKeyListener {
    async fn on_master_key_request(
        &self,
        _request: MasterKeyRequest,
    ) -> StoreResult<MasterKeyResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(MasterKeyResponse {
            master_key: self.master_key.clone(),
            timeout: self.timeout,
        })
    }
}

/// Listener that always fails, for exercising error propagation.
pub struct FailingListener;

#[async_trait]
impl MasterKeyListener for FailingListener {
    async fn on_master_key_request(
        &self,
        _request: MasterKeyRequest,
    ) -> StoreResult<MasterKeyResponse> {
        Err(StoreError::Cancelled)
    }
}

/// A store over a fresh in-memory server.
pub fn memory_store(account_id: &str) -> (Arc<MemoryTransport>, DocumentStore) {
    let transport = MemoryTransport::new();
    let store =
        DocumentStore::new(account_id, transport.clone(), &StoreConfig::default()).unwrap();
    (transport, store)
}
