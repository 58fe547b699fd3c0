//! Upload policy helpers
//!
//! Checks an incoming note file against the configured extension allowlist and size
//! limit, and derives the names used for storage and for downloads.

use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;

/// Why an upload was refused before reaching storage.
#[derive(Debug, Error, PartialEq)]
pub enum UploadRejection {
    #[error("File type not allowed. Allowed types: {}", .allowed.join(", "))]
    ExtensionNotAllowed { allowed: Vec<String> },

    #[error("File too large. Maximum size: {max_mb}MB")]
    TooLarge { max_mb: f64 },
}

/// Extension and size limits for note uploads.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes,
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    /// Validate a client filename and size, returning the lowercase extension (with dot).
    pub fn check(&self, filename: &str, size: usize) -> Result<String, UploadRejection> {
        let ext = extension_of(filename);
        if ext.is_empty() || !self.allowed_extensions.iter().any(|allowed| *allowed == ext) {
            return Err(UploadRejection::ExtensionNotAllowed {
                allowed: self.allowed_extensions.clone(),
            });
        }

        if size > self.max_file_size_bytes {
            return Err(UploadRejection::TooLarge {
                max_mb: self.max_file_size_bytes as f64 / 1024.0 / 1024.0,
            });
        }

        Ok(ext)
    }
}

/// Random storage name keeping the original extension: `{uuid}{ext}`.
pub fn unique_filename(ext: &str) -> String {
    format!("{}{}", Uuid::new_v4(), ext)
}

/// Name offered to the browser when downloading a note stored under `key`.
pub fn download_filename(title: &str, key: &str) -> String {
    let ext = extension_of(key);
    if title.to_lowercase().ends_with(&ext) {
        title.to_string()
    } else {
        format!("{}{}", title, ext)
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
