//! Shared key handling for storage backends.

use crate::{StorageError, StorageResult};

/// Prefix for object-storage keys.
pub const OBJECT_KEY_PREFIX: &str = "uploads";

/// Reject suggested names that could escape a backend's namespace.
///
/// Names may contain `/`-separated directories but must be relative, non-empty and
/// free of `..` segments.
pub fn validate_name(name: &str) -> StorageResult<()> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidKey("File name is empty".to_string()));
    }
    if name.starts_with('/') || name.starts_with('\\') || name.contains('\0') {
        return Err(StorageError::InvalidKey(
            "File name contains invalid characters".to_string(),
        ));
    }
    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "File name contains a parent directory reference".to_string(),
        ));
    }
    Ok(())
}

/// Object-storage key for a file name: `uploads/{name}`.
pub fn object_key(name: &str) -> String {
    format!("{}/{}", OBJECT_KEY_PREFIX, name)
}

/// Final extension of the last path segment, without the dot.
///
/// Leading-dot names such as `.hidden` have no extension.
pub fn extension(name: &str) -> Option<&str> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(dot) if dot + 1 == file_name.len() => None,
        Some(dot) => Some(&file_name[dot + 1..]),
    }
}
