use crate::{create_storage, FileStore, StorageResult};
use notehub_core::Config;
use std::sync::Arc;
use tokio::sync::OnceCell;

static STORAGE: OnceCell<Arc<dyn FileStore>> = OnceCell::const_new();

/// Process-wide storage backend, built from `config` on first use.
///
/// Concurrent first callers wait on a single initialization and all receive the
/// same instance. Later calls ignore `config`. A failed initialization is not
/// cached, so the next call retries.
pub async fn storage_instance(config: &Config) -> StorageResult<Arc<dyn FileStore>> {
    let storage = STORAGE
        .get_or_try_init(|| async {
            let storage = create_storage(config).await?;
            tracing::info!(
                backend = %storage.backend_type(),
                "Process storage instance created"
            );
            Ok::<_, crate::StorageError>(storage)
        })
        .await?;

    Ok(Arc::clone(storage))
}
