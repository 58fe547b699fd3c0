//! Notehub Core Library
//!
//! This crate provides the configuration, storage backend selector, content
//! moderation and upload policy shared by the Notehub components.

pub mod config;
pub mod moderation;
pub mod storage_types;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use moderation::{ContentModerator, ModerationVerdict, ReasonCode};
pub use storage_types::StorageBackend;
pub use upload::{download_filename, unique_filename, UploadPolicy, UploadRejection};
