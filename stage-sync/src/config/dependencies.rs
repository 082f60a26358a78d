//! Dependency initialization and wiring for the stage uploader.

use std::sync::Arc;
use tracing::info;

use crate::{SyncConfig, SyncError};
use stage_sync_ingest::StageLoader;
use stage_sync_repository::FirestoreClient;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured loader, holding the one store connection for the run.
    pub loader: StageLoader,
}

impl Dependencies {
    /// Connect to the document store and build the loader.
    ///
    /// The store client is created exactly once here and shared with the
    /// loader; nothing else opens a connection.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(SyncError)` - If the credentials are unusable or authentication fails
    pub async fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        info!(
            service_account_path = %config.service_account_path.display(),
            stage_dir = %config.stage_dir.display(),
            collection = %config.collection,
            "Initializing dependencies"
        );

        let store = FirestoreClient::connect(config.firestore_config()).await?;

        info!("Firestore connection established");

        let loader = StageLoader::with_config(Arc::new(store), config.loader_config());

        Ok(Self { loader })
    }
}
