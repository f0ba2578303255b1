//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so binary crates can prepare storage
//! without depending directly on `common`.

/// Ensure the data directory used by file-backed providers exists.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_data_dir(data_dir).await
}
