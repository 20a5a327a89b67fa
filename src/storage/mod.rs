//! Blob retrieval: copies the stored raw message to a temporary file.

pub mod fs;
pub mod http;

use std::path::Path;

use async_trait::async_trait;
use tempfile::TempPath;

use crate::error::RetrievalError;

pub use fs::FsBlobStore;
pub use http::HttpBlobStore;

/// A raw message copied to local disk. The file is removed on drop.
#[derive(Debug)]
pub struct FetchedBlob {
    path: TempPath,
}

impl FetchedBlob {
    /// Reserve a fresh temporary file to fetch into.
    pub(crate) fn reserve() -> Result<Self, RetrievalError> {
        let path = tempfile::NamedTempFile::new()?.into_temp_path();
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole blob.
    pub async fn read(&self) -> Result<Vec<u8>, RetrievalError> {
        Ok(tokio::fs::read(self.path()).await?)
    }
}

/// Trait for blob stores: pure I/O, no business logic.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store name for logging.
    fn name(&self) -> &str;

    /// Copy `container`/`key` to a local temporary file.
    async fn fetch(&self, container: &str, key: &str) -> Result<FetchedBlob, RetrievalError>;
}

/// Reject keys that would escape the container.
pub(crate) fn validate_key(key: &str) -> Result<(), RetrievalError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|segment| segment == "..")
    {
        return Err(RetrievalError::InvalidKey(key.to_string()));
    }
    Ok(())
}
