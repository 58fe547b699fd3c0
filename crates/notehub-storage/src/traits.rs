//! Storage abstraction trait
//!
//! This module defines the FileStore trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Operation not supported by {0} storage")]
    Unsupported(StorageBackend),
}

impl StorageError {
    /// Whether the file is simply absent, as opposed to the backend failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// Message safe to show to end users. Never includes paths, keys or credentials.
    pub fn client_message(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "File not found",
            StorageError::InvalidKey(_) => "Invalid file reference",
            StorageError::UploadFailed(_) => "An error occurred while uploading the file",
            StorageError::DownloadFailed(_) => "An error occurred while retrieving the file",
            _ => "A storage error occurred",
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage abstraction
///
/// All storage backends (local filesystem, S3, Cloudinary) implement this trait so
/// that note handling never couples to a particular medium. Implementations must be
/// safe to call concurrently.
///
/// Keys are opaque: callers store the key returned by [`FileStore::save`] and pass
/// it back unchanged.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `content` and return the key to retrieve it with.
    ///
    /// After this returns, `get(key)` yields the same bytes and `exists(key)` is true
    /// until the key is deleted. Distinct suggested names never share a key.
    async fn save(&self, content: Vec<u8>, suggested_name: &str) -> StorageResult<String>;

    /// Read back the exact bytes stored under `key`.
    ///
    /// Fails with [`StorageError::NotFound`] when nothing is stored there.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Remove the file stored under `key`.
    ///
    /// Returns `true` if a file was removed and `false` if there was nothing to
    /// remove or removal failed. Failures are logged, never returned.
    async fn delete(&self, key: &str) -> bool;

    /// Whether a file is stored under `key`.
    ///
    /// Missing keys yield `Ok(false)`; errors are reserved for backend failures.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Generate a time-limited URL for direct access to `key`.
    ///
    /// Only object storage supports this; other backends return
    /// [`StorageError::Unsupported`].
    async fn presigned_url(&self, _key: &str, _expires_in: Duration) -> StorageResult<String> {
        Err(StorageError::Unsupported(self.backend_type()))
    }
}
