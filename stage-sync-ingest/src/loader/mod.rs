//! Loader module for the stage sync ingest.
//!
//! Walks the stage directory and writes each stage into the document store.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::errors::IngestError;
use crate::processor::StageDocument;
use stage_sync_repository::DocumentStore;

/// Default directory holding the stage files.
pub const DEFAULT_STAGE_DIR: &str = "assets/stages";

/// Default collection the stages are written to.
pub const DEFAULT_COLLECTION: &str = "stages";

/// Manifest listing stage ids; it lives alongside the stages but is not one.
pub const STAGE_INDEX_FILE: &str = "stage_index.json";

const STAGE_EXTENSION: &str = ".json";

/// Configuration for the stage loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Directory to read stage files from.
    pub stage_dir: PathBuf,
    /// Collection to write stages into.
    pub collection: String,
    /// File name excluded from upload.
    pub index_file: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            stage_dir: PathBuf::from(DEFAULT_STAGE_DIR),
            collection: DEFAULT_COLLECTION.to_string(),
            index_file: STAGE_INDEX_FILE.to_string(),
        }
    }
}

/// Result of uploading one stage file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The stage was written under this id.
    Uploaded(String),
    /// The file had no usable id and was left alone.
    Skipped,
}

/// Tally of a directory upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Loader that writes stage files into the document store.
///
/// Files are processed one at a time. A failure on one file is logged and
/// does not stop the rest of the batch.
pub struct StageLoader {
    store: Arc<dyn DocumentStore>,
    config: LoaderConfig,
}

impl StageLoader {
    /// Create a new stage loader with the default configuration.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_config(store, LoaderConfig::default())
    }

    /// Create a new stage loader with custom configuration.
    pub fn with_config(store: Arc<dyn DocumentStore>, config: LoaderConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether a directory entry should be uploaded as a stage.
    ///
    /// Compares raw name bytes, so names that are not valid UTF-8 still count.
    pub fn is_stage_file(&self, file_name: impl AsRef<OsStr>) -> bool {
        let name = file_name.as_ref().as_encoded_bytes();
        name.ends_with(STAGE_EXTENSION.as_bytes()) && name != self.config.index_file.as_bytes()
    }

    /// Upload a single stage file.
    ///
    /// # Returns
    ///
    /// * `Ok(UploadOutcome::Uploaded(id))` - The stage was written to `<collection>/<id>`
    /// * `Ok(UploadOutcome::Skipped)` - The file has no usable `id`; nothing was written
    /// * `Err(IngestError)` - The file could not be read, parsed or written
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload_one(&self, path: &Path) -> Result<UploadOutcome, IngestError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let value = serde_json::from_str(&raw).map_err(|source| IngestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let stage = match StageDocument::from_value(value)? {
            Some(stage) => stage,
            None => {
                warn!(path = %path.display(), "Stage has no 'id' field, skipping");
                return Ok(UploadOutcome::Skipped);
            }
        };

        self.store
            .set_document(&self.config.collection, stage.id(), stage.fields())
            .await?;

        info!(stage_id = %stage.id(), "Uploaded stage");
        Ok(UploadOutcome::Uploaded(stage.id().to_string()))
    }

    /// Upload every stage file in the configured directory.
    ///
    /// Files are visited in directory-listing order. Only a failure to list
    /// the directory itself is returned as an error.
    #[instrument(skip(self), fields(stage_dir = %self.config.stage_dir.display()))]
    pub async fn upload_all(&self) -> Result<UploadSummary, IngestError> {
        let stage_dir = &self.config.stage_dir;
        let io_error = |source| IngestError::Io {
            path: stage_dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(stage_dir).await.map_err(io_error)?;
        let mut summary = UploadSummary::default();

        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            if !self.is_stage_file(entry.file_name()) {
                continue;
            }

            let path = entry.path();
            match self.upload_one(&path).await {
                Ok(UploadOutcome::Uploaded(_)) => summary.uploaded += 1,
                Ok(UploadOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Stage upload failed");
                    summary.failed += 1;
                }
            }
        }

        info!(
            uploaded = summary.uploaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "All stages processed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use stage_sync_repository::StoreError;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    type RecordedWrite = (String, String, Map<String, Value>);

    /// In-memory store recording every write.
    #[derive(Default)]
    struct MockStore {
        writes: Mutex<Vec<RecordedWrite>>,
        reject_ids: Vec<String>,
    }

    impl MockStore {
        fn rejecting(ids: &[&str]) -> Self {
            Self {
                writes: Mutex::new(Vec::new()),
                reject_ids: ids.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn writes(&self) -> Vec<RecordedWrite> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentStore for MockStore {
        async fn set_document(
            &self,
            collection: &str,
            document_id: &str,
            fields: &Map<String, Value>,
        ) -> Result<(), StoreError> {
            if self.reject_ids.iter().any(|id| id == document_id) {
                return Err(StoreError::write("Write failed with status 500"));
            }
            self.writes.lock().unwrap().push((
                collection.to_string(),
                document_id.to_string(),
                fields.clone(),
            ));
            Ok(())
        }
    }

    fn loader_for(dir: &TempDir, store: Arc<MockStore>) -> StageLoader {
        let config = LoaderConfig {
            stage_dir: dir.path().to_path_buf(),
            ..LoaderConfig::default()
        };
        StageLoader::with_config(store, config)
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_is_stage_file() {
        let loader = StageLoader::new(Arc::new(MockStore::default()));

        assert!(loader.is_stage_file("a.json"));
        assert!(loader.is_stage_file("stage_index.json.json"));
        assert!(!loader.is_stage_file("stage_index.json"));
        assert!(!loader.is_stage_file("notes.txt"));
        assert!(!loader.is_stage_file("a.json.bak"));
    }

    #[tokio::test]
    async fn test_upload_one_writes_full_document() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "s1.json", r#"{"id":"s1","level":1,"title":"First"}"#);
        let store = Arc::new(MockStore::default());
        let loader = loader_for(&dir, store.clone());

        let outcome = loader.upload_one(&path).await.unwrap();

        assert_eq!(outcome, UploadOutcome::Uploaded("s1".to_string()));
        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        let (collection, id, fields) = &writes[0];
        assert_eq!(collection, "stages");
        assert_eq!(id, "s1");
        assert_eq!(
            Value::Object(fields.clone()),
            json!({ "id": "s1", "level": 1, "title": "First" })
        );
    }

    #[tokio::test]
    async fn test_upload_one_skips_missing_id() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "noid.json", r#"{"puzzle":[[1]]}"#);
        let store = Arc::new(MockStore::default());
        let loader = loader_for(&dir, store.clone());

        let outcome = loader.upload_one(&path).await.unwrap();

        assert_eq!(outcome, UploadOutcome::Skipped);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_upload_one_parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.json", "not valid json");
        let store = Arc::new(MockStore::default());
        let loader = loader_for(&dir, store.clone());

        let err = loader.upload_one(&path).await.unwrap_err();

        assert!(matches!(err, IngestError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_upload_one_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = loader_for(&dir, Arc::new(MockStore::default()));

        let err = loader
            .upload_one(&dir.path().join("gone.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[tokio::test]
    async fn test_upload_one_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "s1.json", r#"{"id":"s1","solution":[[2,1],[1,2]]}"#);
        let store = Arc::new(MockStore::default());
        let loader = loader_for(&dir, store.clone());

        loader.upload_one(&path).await.unwrap();
        loader.upload_one(&path).await.unwrap();

        let writes = store.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0], writes[1]);
    }

    #[tokio::test]
    async fn test_upload_all_mixed_directory() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.json", r#"{"id":"s1","puzzle":[[1,2],[3,4]]}"#);
        write_file(&dir, "stage_index.json", r#"{"ids":["s1"]}"#);
        write_file(&dir, "bad.json", "not valid json");
        write_file(&dir, "readme.txt", r#"{"id":"txt"}"#);
        let store = Arc::new(MockStore::default());
        let loader = loader_for(&dir, store.clone());

        let summary = loader.upload_all().await.unwrap();

        assert_eq!(
            summary,
            UploadSummary {
                uploaded: 1,
                skipped: 0,
                failed: 1
            }
        );
        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        let (collection, id, fields) = &writes[0];
        assert_eq!(collection, "stages");
        assert_eq!(id, "s1");
        let puzzle = fields["puzzle"].as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(puzzle).unwrap(),
            json!([[1, 2], [3, 4]])
        );
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_upload_all_includes_non_utf8_file_names() {
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let name = OsStr::from_bytes(b"st\xffage.json");
        assert!(name.to_str().is_none());
        fs::write(dir.path().join(name), r#"{"id":"s9"}"#).unwrap();
        let store = Arc::new(MockStore::default());
        let loader = loader_for(&dir, store.clone());

        assert!(loader.is_stage_file(name));
        let summary = loader.upload_all().await.unwrap();

        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.failed, 0);
        let ids: Vec<String> = store.writes().into_iter().map(|(_, id, _)| id).collect();
        assert_eq!(ids, vec!["s9".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_all_continues_past_store_failure() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "one.json", r#"{"id":"s1"}"#);
        write_file(&dir, "two.json", r#"{"id":"s2"}"#);
        write_file(&dir, "three.json", r#"{"id":""}"#);
        let store = Arc::new(MockStore::rejecting(&["s1"]));
        let loader = loader_for(&dir, store.clone());

        let summary = loader.upload_all().await.unwrap();

        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        let ids: Vec<String> = store.writes().into_iter().map(|(_, id, _)| id).collect();
        assert_eq!(ids, vec!["s2".to_string()]);
    }

    #[tokio::test]
    async fn test_upload_all_missing_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let config = LoaderConfig {
            stage_dir: dir.path().join("missing"),
            ..LoaderConfig::default()
        };
        let loader = StageLoader::with_config(Arc::new(MockStore::default()), config);

        let result = loader.upload_all().await;
        assert!(matches!(result, Err(IngestError::Io { .. })));
    }
}
