use anyhow::Context;
use notehub_core::ModerationVerdict;
use notehub_storage::StorageError;
use serde::Serialize;
use std::time::Duration;

/// Default lifetime of a presigned download URL.
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so stdout stays valid JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Process exit code for a moderation verdict.
pub fn verdict_exit_code(verdict: &ModerationVerdict) -> i32 {
    if verdict.is_accepted() {
        0
    } else {
        1
    }
}

/// JSON body reported for a failed storage command.
///
/// Always carries the generic client message. Backend details (paths, keys,
/// provider responses) are only added outside production.
pub fn storage_error_body(error: &StorageError, production: bool) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": error.client_message(),
        "not_found": error.is_not_found(),
    });
    if !production {
        body["detail"] = serde_json::Value::String(error.to_string());
    }
    body
}
