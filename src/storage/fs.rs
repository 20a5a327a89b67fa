//! Filesystem blob store: objects live at `{root}/{container}/{key}`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::RetrievalError;
use crate::storage::{BlobStore, FetchedBlob, validate_key};

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn fetch(&self, container: &str, key: &str) -> Result<FetchedBlob, RetrievalError> {
        validate_key(container)?;
        validate_key(key)?;

        let source = self.root.join(container).join(key);
        if !tokio::fs::try_exists(&source).await? {
            return Err(RetrievalError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            });
        }

        let blob = FetchedBlob::reserve()?;
        let bytes = tokio::fs::copy(&source, blob.path()).await?;
        debug!(container, key, bytes, "Fetched blob from filesystem");
        Ok(blob)
    }
}
