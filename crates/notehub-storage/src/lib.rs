//! Notehub Storage Library
//!
//! This crate provides the `FileStore` abstraction for uploaded note files and its
//! backends: local filesystem, S3-compatible object storage and Cloudinary.
//!
//! # Keys
//!
//! `save` returns an opaque key that callers persist and hand back unchanged to
//! `get`, `delete` and `exists`. Each backend picks its own format:
//!
//! - **Local**: the file path, `{upload_dir}/{name}`
//! - **S3**: the object key, `uploads/{name}`
//! - **Cloudinary**: the public id, `{folder}/{name}`
//!
//! # Selection
//!
//! `create_storage` builds the backend named by configuration and falls back to local
//! storage when the backend is misconfigured or fails to build. `storage_instance`
//! caches that result for the life of the process.

#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
pub mod factory;
pub mod global;
pub(crate) mod keys;
pub mod lifecycle;
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStorage;
pub use factory::{create_local_storage, create_storage};
pub use global::storage_instance;
pub use lifecycle::discard_after_commit;
pub use local::LocalStorage;
pub use notehub_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{FileStore, StorageError, StorageResult};
