//! Runtime settings read from the environment.

use std::env;
use std::path::PathBuf;

use stage_sync_ingest::loader::{DEFAULT_COLLECTION, DEFAULT_STAGE_DIR, STAGE_INDEX_FILE};
use stage_sync_ingest::LoaderConfig;
use stage_sync_repository::config::DEFAULT_DATABASE;
use stage_sync_repository::FirestoreConfig;

use crate::SyncError;

/// Default location of the service-account key file.
const DEFAULT_SERVICE_ACCOUNT_PATH: &str = "lib/firebase_service_account.json";

/// Settings for one upload run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub service_account_path: PathBuf,
    pub stage_dir: PathBuf,
    pub collection: String,
    pub database: String,
    pub project_id: Option<String>,
    pub emulator_host: Option<String>,
}

impl SyncConfig {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SERVICE_ACCOUNT_PATH`: key file (default: lib/firebase_service_account.json)
    /// - `STAGE_FOLDER`: directory of stage files (default: assets/stages)
    /// - `COLLECTION_NAME`: target collection (default: stages)
    /// - `FIRESTORE_DATABASE`: database id (default: (default))
    /// - `FIRESTORE_PROJECT_ID`: overrides the key file's project
    /// - `FIRESTORE_EMULATOR_HOST`: write to a local emulator instead
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> Result<String, SyncError> {
            match lookup(key) {
                Some(value) if value.trim().is_empty() => {
                    Err(SyncError::config(format!("{} is set but empty", key)))
                }
                Some(value) => Ok(value),
                None => Ok(default.to_string()),
            }
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            service_account_path: PathBuf::from(get(
                "SERVICE_ACCOUNT_PATH",
                DEFAULT_SERVICE_ACCOUNT_PATH,
            )?),
            stage_dir: PathBuf::from(get("STAGE_FOLDER", DEFAULT_STAGE_DIR)?),
            collection: get("COLLECTION_NAME", DEFAULT_COLLECTION)?,
            database: get("FIRESTORE_DATABASE", DEFAULT_DATABASE)?,
            project_id: optional("FIRESTORE_PROJECT_ID"),
            emulator_host: optional("FIRESTORE_EMULATOR_HOST"),
        })
    }

    pub fn firestore_config(&self) -> FirestoreConfig {
        let mut config = FirestoreConfig::new(self.service_account_path.clone())
            .with_database(self.database.clone());
        if let Some(project_id) = &self.project_id {
            config = config.with_project_id(project_id.clone());
        }
        if let Some(host) = &self.emulator_host {
            config = config.with_emulator_host(host.clone());
        }
        config
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            stage_dir: self.stage_dir.clone(),
            collection: self.collection.clone(),
            index_file: STAGE_INDEX_FILE.to_string(),
        }
    }
}
