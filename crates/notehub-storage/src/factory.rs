#[cfg(feature = "storage-cloudinary")]
use crate::cloudinary::{CloudinaryCredentials, CloudinaryStorage};
#[cfg(feature = "storage-s3")]
use crate::s3::{S3Credentials, S3Storage};
use crate::{FileStore, LocalStorage, StorageBackend, StorageError, StorageResult};
use notehub_core::Config;
use std::sync::Arc;

/// Create the storage backend named by configuration.
///
/// When the selected remote backend is missing settings or fails to build, a warning
/// is logged and local storage is used instead. Only a failure to set up local
/// storage itself is returned as an error.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn FileStore>> {
    let backend = config.storage_backend;

    if backend == StorageBackend::Local {
        return create_local_storage(config).await;
    }

    let issues = config.storage_issues();
    if !issues.is_empty() {
        tracing::warn!(
            backend = %backend,
            issues = ?issues,
            "Storage credentials not set, falling back to local storage"
        );
        return create_local_storage(config).await;
    }

    match create_remote_storage(config, backend) {
        Ok(storage) => {
            tracing::info!(backend = %backend, "Storage backend initialized");
            Ok(storage)
        }
        Err(e) => {
            tracing::warn!(
                backend = %backend,
                error = %e,
                "Failed to initialize storage backend, falling back to local storage"
            );
            create_local_storage(config).await
        }
    }
}

/// Create local storage under the configured upload directory.
pub async fn create_local_storage(config: &Config) -> StorageResult<Arc<dyn FileStore>> {
    let storage = LocalStorage::new(&config.upload_dir).await?;
    tracing::info!(upload_dir = %config.upload_dir, "Local storage initialized");
    Ok(Arc::new(storage))
}

fn create_remote_storage(
    config: &Config,
    backend: StorageBackend,
) -> StorageResult<Arc<dyn FileStore>> {
    match backend {
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage is not a remote backend".to_string(),
        )),

        #[cfg(feature = "storage-cloudinary")]
        StorageBackend::Cloudinary => {
            let missing =
                |name: &str| StorageError::ConfigError(format!("{} not configured", name));
            let credentials = CloudinaryCredentials {
                cloud_name: config
                    .cloudinary_cloud_name
                    .clone()
                    .ok_or_else(|| missing("CLOUDINARY_CLOUD_NAME"))?,
                api_key: config
                    .cloudinary_api_key
                    .clone()
                    .ok_or_else(|| missing("CLOUDINARY_API_KEY"))?,
                api_secret: config
                    .cloudinary_api_secret
                    .clone()
                    .ok_or_else(|| missing("CLOUDINARY_API_SECRET"))?,
            };

            let storage = CloudinaryStorage::new(credentials, config.cloudinary_folder.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-cloudinary"))]
        StorageBackend::Cloudinary => Err(StorageError::ConfigError(
            "Cloudinary storage backend not available (storage-cloudinary feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET_NAME not configured".to_string()))?;
            let credentials = match (&config.aws_access_key_id, &config.aws_secret_access_key) {
                (Some(access_key_id), Some(secret_access_key)) => Some(S3Credentials {
                    access_key_id: access_key_id.clone(),
                    secret_access_key: secret_access_key.clone(),
                }),
                _ => None,
            };

            let storage = S3Storage::new(
                bucket,
                config.s3_region.clone(),
                config.s3_endpoint.clone(),
                credentials,
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),
    }
}
