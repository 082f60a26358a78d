//! Error types for the stage sync ingest.

use std::path::PathBuf;

use stage_sync_repository::StoreError;
use thiserror::Error;

/// Errors that can occur while uploading a single stage file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON is well formed but cannot be stored as a stage.
    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    /// Error from the document store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Create an invalid stage error.
    pub fn invalid_stage(msg: impl Into<String>) -> Self {
        Self::InvalidStage(msg.into())
    }
}
