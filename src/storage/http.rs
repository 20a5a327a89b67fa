//! HTTP blob store: objects are fetched with `GET {base_url}/{container}/{key}`.

use async_trait::async_trait;
use tracing::debug;

use crate::error::RetrievalError;
use crate::storage::{BlobStore, FetchedBlob, validate_key};

pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn object_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, container, key)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, container: &str, key: &str) -> Result<FetchedBlob, RetrievalError> {
        validate_key(container)?;
        validate_key(key)?;

        let url = self.object_url(container, key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RetrievalError::Http(format!("GET {url} failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RetrievalError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            });
        }

        let bytes = response
            .error_for_status()
            .map_err(|e| RetrievalError::Http(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| RetrievalError::Http(format!("Failed to read body of {url}: {e}")))?;

        let blob = FetchedBlob::reserve()?;
        tokio::fs::write(blob.path(), &bytes).await?;
        debug!(container, key, bytes = bytes.len(), "Fetched blob over HTTP");
        Ok(blob)
    }
}
