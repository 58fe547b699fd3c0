use crate::keys;
use crate::traits::{FileStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Keys are file paths under the base directory, e.g. `uploads/3f2a.pdf`.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating `base_path` if needed.
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "uploads")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a key back to a filesystem path.
    ///
    /// `None` for keys that cannot name a file under the base directory. Nothing
    /// could have been saved there, so callers treat such keys as absent and never
    /// touch the filesystem for them.
    fn key_to_path(&self, key: &str) -> Option<PathBuf> {
        let path = PathBuf::from(key);

        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        if !path.starts_with(&self.base_path) || path == self.base_path {
            return None;
        }

        Some(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalStorage {
    async fn save(&self, content: Vec<u8>, suggested_name: &str) -> StorageResult<String> {
        keys::validate_name(suggested_name)?;
        let path = self.base_path.join(suggested_name);
        let key = path.to_string_lossy().into_owned();
        let size = content.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&content).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage save successful"
        );

        Ok(key)
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let Some(path) = self.key_to_path(key) else {
            tracing::debug!(key = %key, "Key outside storage directory");
            return Err(StorageError::NotFound(key.to_string()));
        };
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::info!(
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn delete(&self, key: &str) -> bool {
        let Some(path) = self.key_to_path(key) else {
            tracing::error!(key = %key, "Refusing to delete file outside storage directory");
            return false;
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %key, "Local storage delete successful");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Error deleting file");
                false
            }
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.key_to_path(key) {
            Some(path) => Ok(fs::try_exists(&path).await?),
            None => Ok(false),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = b"%PDF-1.7 lecture notes\x00\xff".to_vec();
        let key = storage.save(data.clone(), "notes.pdf").await.unwrap();

        assert!(key.ends_with("notes.pdf"));
        assert!(Path::new(&key).starts_with(dir.path()));
        assert_eq!(storage.get(&key).await.unwrap(), data);
        assert!(storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_creates_base_dir() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("nested").join("uploads");
        let storage = LocalStorage::new(&base).await.unwrap();

        assert!(base.is_dir());
        let key = storage.save(Vec::new(), "class/empty.txt").await.unwrap();
        assert!(storage.get(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_storage_delete_twice() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let key = storage.save(b"x".to_vec(), "once.txt").await.unwrap();

        assert!(storage.delete(&key).await);
        assert!(!storage.delete(&key).await);
        assert!(!storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_missing_key() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let key = dir.path().join("never-saved.pdf");
        let key = key.to_string_lossy();

        assert!(!storage.exists(&key).await.unwrap());
        let result = storage.get(&key).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_keys_outside_base_are_absent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(!storage.exists("never-saved.pdf").await.unwrap());
        let result = storage.get("never-saved.pdf").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        // A key from a previous upload directory.
        assert!(!storage.exists("old-uploads/3f2a.pdf").await.unwrap());
        assert!(storage
            .get("old-uploads/3f2a.pdf")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("inside.txt"), b"x").unwrap();

        let escaped = format!("{}/sub/../inside.txt", dir.path().display());
        let result = storage.get(&escaped).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(!storage.exists(&escaped).await.unwrap());
        assert!(!storage.delete(&escaped).await);
        assert!(dir.path().join("inside.txt").exists());

        // Exists on disk, but outside the storage directory.
        assert!(!storage.exists("/etc/passwd").await.unwrap());
        assert!(!storage.delete("/etc/passwd").await);

        let result = storage.save(b"x".to_vec(), "../outside.txt").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_save_overwrites_same_name() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let first = storage.save(b"first".to_vec(), "same.txt").await.unwrap();
        let second = storage.save(b"second".to_vec(), "same.txt").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.get(&second).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_presigned_url_unsupported() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage
            .presigned_url("anything", Duration::from_secs(60))
            .await;
        assert!(matches!(
            result,
            Err(StorageError::Unsupported(StorageBackend::Local))
        ));
    }
}
