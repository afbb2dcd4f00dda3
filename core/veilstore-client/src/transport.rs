//! The document-server capability and its HTTP implementation.
//!
//! `DocumentTransport` is the seam between the store facade and the
//! remote server: eight operations over opaque records and blinded ids.
//! `HttpTransport` renders them against the document-store REST API with
//! JSON bodies.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::types::{BlindedQuery, EncryptedDocument};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use veilstore_crypto::WrappedMasterKey;

/// Remote storage operations consumed by the store facade.
///
/// Implementations see only ciphertext and blinded tokens; mapping of
/// server status codes to the error taxonomy is their responsibility.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
    /// Store the wrapped master key only if none exists yet.
    /// An existing key surfaces as [`StoreError::Duplicate`].
    async fn put_master_key_if_absent(&self, wrapped: &WrappedMasterKey) -> StoreResult<()>;

    /// Replace the stored wrapped master key.
    async fn post_master_key(&self, wrapped: &WrappedMasterKey) -> StoreResult<()>;

    /// Fetch the stored wrapped master key.
    async fn get_master_key(&self) -> StoreResult<WrappedMasterKey>;

    /// Create a document. An existing blinded id surfaces as
    /// [`StoreError::Duplicate`].
    async fn insert_document(&self, document: &EncryptedDocument) -> StoreResult<()>;

    /// Create or replace the document at `blinded_id`.
    async fn put_document(
        &self,
        blinded_id: &str,
        document: &EncryptedDocument,
    ) -> StoreResult<()>;

    /// Fetch the document at `blinded_id`.
    async fn get_document(&self, blinded_id: &str) -> StoreResult<EncryptedDocument>;

    /// Delete the document at `blinded_id`. Returns `false` when there
    /// was nothing to delete.
    async fn delete_document(&self, blinded_id: &str) -> StoreResult<bool>;

    /// Run a blinded query and return the matching records.
    async fn query(&self, query: &BlindedQuery) -> StoreResult<Vec<EncryptedDocument>>;
}

/// `DocumentTransport` over the document-store REST API.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    root: String,
}

impl HttpTransport {
    /// Build a transport rooted at
    /// `{api_base_url}{storage_prefix}/{urlencoded account_id}`.
    pub fn new(config: &StoreConfig, account_id: &str) -> StoreResult<Self> {
        if account_id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "account id must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let root = format!(
            "{}{}/{}",
            config.api_base_url.trim_end_matches('/'),
            config.storage_prefix,
            urlencoding::encode(account_id),
        );

        Ok(Self { client, root })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path)
    }
}

/// Reject any non-2xx response that the caller has not already handled.
fn expect_success(response: Response, context: &str) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::Transport {
            status: Some(status.as_u16()),
            message: format!("{context}: server returned {status}"),
        })
    }
}

/// Parse a 2xx body. A body the server mangled is a format defect, not a
/// transport failure.
async fn parse_body<T: serde::de::DeserializeOwned>(response: Response) -> StoreResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl DocumentTransport for HttpTransport {
    async fn put_master_key_if_absent(&self, wrapped: &WrappedMasterKey) -> StoreResult<()> {
        let url = self.url("master-key");
        let response = self
            .client
            .put(&url)
            .header("If-None-Match", "*")
            .json(wrapped)
            .send()
            .await?;
        debug!(status = %response.status(), "PUT master-key");

        match response.status() {
            StatusCode::NOT_MODIFIED | StatusCode::PRECONDITION_FAILED => Err(
                StoreError::Duplicate("master key already exists".to_string()),
            ),
            _ => expect_success(response, "store master key").map(|_| ()),
        }
    }

    async fn post_master_key(&self, wrapped: &WrappedMasterKey) -> StoreResult<()> {
        let url = self.url("master-key");
        let response = self.client.post(&url).json(wrapped).send().await?;
        debug!(status = %response.status(), "POST master-key");
        expect_success(response, "replace master key").map(|_| ())
    }

    async fn get_master_key(&self) -> StoreResult<WrappedMasterKey> {
        let url = self.url("master-key");
        let response = self.client.get(&url).send().await?;
        debug!(status = %response.status(), "GET master-key");

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound("master key not found".to_string()));
        }
        let response = expect_success(response, "fetch master key")?;
        parse_body(response).await
    }

    async fn insert_document(&self, document: &EncryptedDocument) -> StoreResult<()> {
        let url = self.url("documents");
        let response = self.client.post(&url).json(document).send().await?;
        debug!(status = %response.status(), "POST documents");

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::Duplicate(
                "document already exists".to_string(),
            ));
        }
        expect_success(response, "insert document").map(|_| ())
    }

    async fn put_document(
        &self,
        blinded_id: &str,
        document: &EncryptedDocument,
    ) -> StoreResult<()> {
        let url = self.url(&format!("documents/{blinded_id}"));
        let response = self.client.put(&url).json(document).send().await?;
        debug!(status = %response.status(), "PUT documents/{blinded_id}");
        expect_success(response, "store document").map(|_| ())
    }

    async fn get_document(&self, blinded_id: &str) -> StoreResult<EncryptedDocument> {
        let url = self.url(&format!("documents/{blinded_id}"));
        let response = self.client.get(&url).send().await?;
        debug!(status = %response.status(), "GET documents/{blinded_id}");

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!(
                "no document with id {blinded_id}"
            )));
        }
        let response = expect_success(response, "fetch document")?;
        parse_body(response).await
    }

    async fn delete_document(&self, blinded_id: &str) -> StoreResult<bool> {
        let url = self.url(&format!("documents/{blinded_id}"));
        let response = self.client.delete(&url).send().await?;
        debug!(status = %response.status(), "DELETE documents/{blinded_id}");

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_success(response, "delete document").map(|_| true)
    }

    async fn query(&self, query: &BlindedQuery) -> StoreResult<Vec<EncryptedDocument>> {
        let url = self.url("query");
        let response = self.client.post(&url).json(query).send().await?;
        debug!(status = %response.status(), "POST query");

        let response = expect_success(response, "query documents")?;
        parse_body(response).await
    }
}
