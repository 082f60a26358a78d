//! # Stage Sync
//!
//! Entry point and configuration for uploading puzzle stages into Firestore.

pub mod config;

pub use config::{Dependencies, SyncConfig};

use thiserror::Error;

/// Errors that stop the upload before or while it starts.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Document store error, typically bad credentials.
    #[error("Store error: {0}")]
    Store(#[from] stage_sync_repository::StoreError),

    /// The stage directory could not be listed.
    #[error("Ingest error: {0}")]
    Ingest(#[from] stage_sync_ingest::IngestError),
}

impl SyncError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
