//! Configuration module
//!
//! This module provides the process configuration: storage backend selection and
//! per-backend settings, moderation lexicon sources, and upload limits.

use std::env;

use crate::storage_types::StorageBackend;

const UPLOAD_DIR: &str = "uploads";
const CLOUDINARY_FOLDER: &str = "pennwest_uploads";
const AWS_REGION: &str = "us-east-1";
const MAX_FILE_SIZE_MB: usize = 10;
const ALLOWED_EXTENSIONS: &str = ".pdf,.doc,.docx,.txt,.png,.jpg,.jpeg";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub upload_dir: String,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_folder: String,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    // Moderation
    pub profanity_wordlist_path: Option<String>,
    pub profanity_blocklist: Vec<String>,
    // Uploads
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Local,
            upload_dir: UPLOAD_DIR.to_string(),
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
            cloudinary_folder: CLOUDINARY_FOLDER.to_string(),
            s3_bucket: None,
            s3_region: AWS_REGION.to_string(),
            s3_endpoint: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            profanity_wordlist_path: None,
            profanity_blocklist: Vec::new(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: parse_extensions(ALLOWED_EXTENSIONS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match var("STORAGE_TYPE").or_else(|| var("STORAGE_BACKEND")) {
            Some(raw) => raw.parse::<StorageBackend>().unwrap_or_else(|_| {
                tracing::warn!(
                    storage_type = %raw,
                    "Unknown storage type, using local storage"
                );
                StorageBackend::Local
            }),
            None => StorageBackend::Local,
        };

        let max_file_size_mb = match var("MAX_FILE_SIZE_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE_MB must be a valid number"))?,
            None => MAX_FILE_SIZE_MB,
        };

        let config = Config {
            environment,
            storage_backend,
            upload_dir: var("UPLOAD_DIR").unwrap_or_else(|| UPLOAD_DIR.to_string()),
            cloudinary_cloud_name: var("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: var("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: var("CLOUDINARY_API_SECRET"),
            cloudinary_folder: var("CLOUDINARY_FOLDER")
                .unwrap_or_else(|| CLOUDINARY_FOLDER.to_string()),
            s3_bucket: var("S3_BUCKET_NAME").or_else(|| var("S3_BUCKET")),
            s3_region: var("AWS_REGION")
                .or_else(|| var("S3_REGION"))
                .unwrap_or_else(|| AWS_REGION.to_string()),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_access_key_id: var("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            profanity_wordlist_path: var("PROFANITY_WORDLIST_PATH"),
            profanity_blocklist: var("PROFANITY_BLOCKLIST")
                .map(|s| {
                    s.split(',')
                        .map(|word| word.trim().to_lowercase())
                        .filter(|word| !word.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions: parse_extensions(
                &var("ALLOWED_EXTENSIONS").unwrap_or_else(|| ALLOWED_EXTENSIONS.to_string()),
            ),
        };

        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Settings the selected storage backend needs but does not have.
    ///
    /// An empty list means the backend can be constructed. Missing settings are not
    /// fatal: storage selection falls back to the local backend.
    pub fn storage_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self.storage_backend {
            StorageBackend::Local => {}
            StorageBackend::Cloudinary => {
                for (name, value) in [
                    ("CLOUDINARY_CLOUD_NAME", &self.cloudinary_cloud_name),
                    ("CLOUDINARY_API_KEY", &self.cloudinary_api_key),
                    ("CLOUDINARY_API_SECRET", &self.cloudinary_api_secret),
                ] {
                    if value.is_none() {
                        issues.push(format!(
                            "{} must be set when using cloudinary storage backend",
                            name
                        ));
                    }
                }
            }
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    issues.push(
                        "S3_BUCKET_NAME must be set when using s3 storage backend".to_string(),
                    );
                }
                if self.aws_access_key_id.is_some() != self.aws_secret_access_key.is_some() {
                    issues.push(
                        "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
                            .to_string(),
                    );
                }
            }
        }
        issues
    }
}

/// Normalize a comma-separated extension list to lowercase, dot-prefixed entries.
fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .map(|s| format!(".{}", s))
        .collect()
}
