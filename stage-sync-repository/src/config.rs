//! Configuration types for the FirestoreClient.

use std::path::PathBuf;

/// Default Firestore database id.
pub const DEFAULT_DATABASE: &str = "(default)";

/// Configuration for the FirestoreClient.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Path to the service-account key file.
    pub service_account_path: PathBuf,
    /// Project to write into. Falls back to the key file's `project_id`.
    pub project_id: Option<String>,
    /// Database id within the project.
    pub database: String,
    /// `host:port` of a local emulator. When set, token exchange is skipped.
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create a config for the given key file with default settings.
    pub fn new(service_account_path: impl Into<PathBuf>) -> Self {
        Self {
            service_account_path: service_account_path.into(),
            project_id: None,
            database: DEFAULT_DATABASE.to_string(),
            emulator_host: None,
        }
    }

    /// Override the project id from the key file.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Use a non-default database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Point the client at a local emulator.
    pub fn with_emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }
}
