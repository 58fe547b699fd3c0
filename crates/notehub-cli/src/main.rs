//! Notehub CLI: moderate text and operate on the configured file store.
//!
//! Storage settings come from the environment (and `.env`), e.g. STORAGE_TYPE,
//! UPLOAD_DIR, S3_BUCKET_NAME or CLOUDINARY_CLOUD_NAME.

use anyhow::Context;
use clap::{Parser, Subcommand};
use notehub_cli::{
    init_tracing, print_json, storage_error_body, verdict_exit_code, DEFAULT_PRESIGN_EXPIRY,
};
use notehub_core::{unique_filename, Config, ContentModerator, UploadPolicy};
use notehub_storage::{storage_instance, StorageError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "notehub", about = "Notehub moderation and storage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check text against the moderation rules
    Moderate {
        /// Field name used in the rejection message
        #[arg(long, default_value = "content")]
        field: String,
        /// Text to check
        text: String,
    },
    /// File store operations
    Store {
        #[command(subcommand)]
        sub: StoreCommands,
    },
}

#[derive(Subcommand)]
enum StoreCommands {
    /// Save a file and print its storage key
    Save {
        /// Path to the file to save
        file: PathBuf,
        /// Stored name; defaults to a random name with the file's extension
        #[arg(long)]
        name: Option<String>,
    },
    /// Read a stored file
    Get {
        /// Storage key
        key: String,
        /// Write to this path instead of reporting the size
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a stored file
    Delete {
        /// Storage key
        key: String,
    },
    /// Check whether a key exists
    Exists {
        /// Storage key
        key: String,
    },
    /// Generate a time-limited download URL (S3 only)
    Presign {
        /// Storage key
        key: String,
        /// URL lifetime in seconds
        #[arg(long)]
        expires_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Moderate { field, text } => {
            let moderator = ContentModerator::from_config(&config);
            let verdict = moderator.evaluate(text.as_str(), &field);
            print_json(&verdict)?;
            let code = verdict_exit_code(&verdict);
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Store { sub } => {
            if let Err(e) = run_store(&config, sub).await {
                let Some(storage_error) = e.downcast_ref::<StorageError>() else {
                    return Err(e);
                };
                tracing::error!(error = %storage_error, "Storage operation failed");
                print_json(&storage_error_body(storage_error, config.is_production()))?;
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_store(config: &Config, sub: StoreCommands) -> anyhow::Result<()> {
    let store = storage_instance(config).await?;

    match sub {
        StoreCommands::Save { file, name } => {
            let content = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file.to_string_lossy();
            let ext = UploadPolicy::from_config(config).check(&filename, content.len())?;
            let name = name.unwrap_or_else(|| unique_filename(&ext));
            let size = content.len();

            let key = store.save(content, &name).await?;
            print_json(&serde_json::json!({
                "key": key,
                "backend": store.backend_type(),
                "size_bytes": size,
            }))?;
        }
        StoreCommands::Get { key, out } => {
            let data = store.get(&key).await?;
            if let Some(out) = &out {
                tokio::fs::write(out, &data)
                    .await
                    .with_context(|| format!("Failed to write {}", out.display()))?;
            }
            print_json(&serde_json::json!({
                "key": key,
                "size_bytes": data.len(),
                "written_to": out.map(|p| p.display().to_string()),
            }))?;
        }
        StoreCommands::Delete { key } => {
            let deleted = store.delete(&key).await;
            print_json(&serde_json::json!({ "key": key, "deleted": deleted }))?;
        }
        StoreCommands::Exists { key } => {
            let exists = store.exists(&key).await?;
            print_json(&serde_json::json!({ "key": key, "exists": exists }))?;
        }
        StoreCommands::Presign { key, expires_secs } => {
            let expires_in = expires_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY);
            let url = store.presigned_url(&key, expires_in).await?;
            print_json(&serde_json::json!({
                "key": key,
                "url": url,
                "expires_in_secs": expires_in.as_secs(),
            }))?;
        }
    }

    Ok(())
}
