//! Dependency download step.
//!
//! Runs `go mod download --json` in the project directory and decodes the
//! concatenated JSON stream it prints. Version selection is entirely the go
//! tool's job; this module only reports where each resolved module landed on
//! disk. Any failure here is fatal and surfaced before hashing begins.

use crate::error::GenerateError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// One module reported by `go mod download --json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModDownload {
    pub path: String,
    #[serde(default)]
    pub version: String,
    /// Absolute path of the extracted module in the local module cache.
    #[serde(default)]
    pub dir: PathBuf,
    /// Ecosystem checksum of the module zip (`go.sum` format).
    #[serde(default)]
    pub sum: String,
    #[serde(default)]
    pub go_mod_sum: String,
    /// Per-module failure reported by the go tool.
    #[serde(default)]
    pub error: Option<String>,
}

/// Download all dependencies of the module in `dir`.
pub fn download_modules(dir: &Path) -> Result<Vec<ModDownload>, GenerateError> {
    info!(dir = %dir.display(), "Downloading dependencies");

    let output = Command::new("go")
        .args(["mod", "download", "--json"])
        .current_dir(dir)
        .output()
        .map_err(|e| GenerateError::Download(format!("failed to run go: {e}")))?;

    let downloads = parse_download_stream(&output.stdout)?;

    if let Some(failed) = downloads.iter().find(|dl| dl.error.is_some()) {
        return Err(GenerateError::Download(format!(
            "{}@{}: {}",
            failed.path,
            failed.version,
            failed.error.as_deref().unwrap_or("unknown error")
        )));
    }
    if !output.status.success() {
        return Err(GenerateError::Download(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    info!(modules = downloads.len(), "Done downloading dependencies");
    Ok(downloads)
}

/// Decode the concatenated JSON objects `go mod download --json` emits.
pub fn parse_download_stream(bytes: &[u8]) -> Result<Vec<ModDownload>, GenerateError> {
    let stream = serde_json::Deserializer::from_slice(bytes).into_iter::<ModDownload>();
    let downloads = stream.collect::<Result<Vec<_>, _>>()?;
    Ok(downloads)
}
