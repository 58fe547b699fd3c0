use crate::FileStore;

/// Delete a stored file once the record that referenced it has been removed.
///
/// Runs after the metadata deletion has committed, so it never fails: a missing
/// file only produces a warning and the record stays deleted either way.
pub async fn discard_after_commit(store: &dyn FileStore, key: &str) -> bool {
    let deleted = store.delete(key).await;

    if deleted {
        tracing::info!(
            key = %key,
            backend = %store.backend_type(),
            "Stored file removed after record deletion"
        );
    } else {
        tracing::warn!(
            key = %key,
            backend = %store.backend_type(),
            "Stored file was not removed after record deletion"
        );
    }

    deleted
}
