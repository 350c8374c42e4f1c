//! Error types for the dependency hash-generation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while turning a Go module set into hashed package records.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type in dependency tree: {0}")]
    UnsupportedNode(PathBuf),

    #[error("file changed while archiving {path}: expected {expected} bytes, read {actual}")]
    InconsistentFile {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("failed to parse go.mod: {0}")]
    ModFile(String),

    #[error("go mod download failed: {0}")]
    Download(String),

    #[error("failed to decode module download metadata: {0}")]
    DownloadDecode(#[from] serde_json::Error),

    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    ManifestSerialize(#[from] toml::ser::Error),

    #[error("worker thread panicked")]
    WorkerPanic,
}

impl GenerateError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}
