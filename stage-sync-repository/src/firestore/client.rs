//! Firestore client implementation.
//!
//! This module provides the concrete implementation of `DocumentStore`
//! on top of the Firestore REST API.

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::FirestoreConfig;
use crate::errors::StoreError;
use crate::firestore::credentials::{AccessToken, ServiceAccount};
use crate::firestore::value::encode_fields;
use crate::interfaces::DocumentStore;

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Bearer token the emulator accepts in place of a real one.
const EMULATOR_TOKEN: &str = "owner";

/// Refresh the access token when it has less than this long to live.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

enum Authenticator {
    ServiceAccount {
        account: ServiceAccount,
        token: Mutex<AccessToken>,
    },
    Emulator,
}

/// Firestore client implementation.
///
/// Construct one per process with [`FirestoreClient::connect`] and share it;
/// every write reuses the same HTTP connection pool and access token.
///
/// # Example
///
/// ```ignore
/// let config = FirestoreConfig::new("lib/firebase_service_account.json");
/// let client = FirestoreClient::connect(config).await?;
///
/// let mut fields = serde_json::Map::new();
/// fields.insert("id".to_string(), json!("s1"));
/// client.set_document("stages", "s1", &fields).await?;
/// ```
pub struct FirestoreClient {
    http: reqwest::Client,
    documents_url: Url,
    auth: Authenticator,
}

impl FirestoreClient {
    /// Load credentials and authenticate.
    ///
    /// # Arguments
    ///
    /// * `config` - Key file location, project, database and optional emulator host
    ///
    /// # Returns
    ///
    /// * `Ok(FirestoreClient)` - A client holding a valid access token
    /// * `Err(StoreError)` - If the key file is unusable or the token exchange fails
    pub async fn connect(config: FirestoreConfig) -> Result<Self, StoreError> {
        let account = ServiceAccount::load(&config.service_account_path)?;

        let project_id = match config.project_id.as_deref().or(account.project_id()) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(StoreError::credentials(
                    "no project_id in key file or configuration",
                ))
            }
        };

        let mut builder = reqwest::Client::builder();
        if config.emulator_host.is_some() {
            // The emulator is local; a system proxy would never reach it.
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let (base_url, auth) = match config.emulator_host.as_deref() {
            Some(host) => (format!("http://{}/v1", host), Authenticator::Emulator),
            None => {
                let token = account.fetch_token(&http).await?;
                (
                    FIRESTORE_BASE_URL.to_string(),
                    Authenticator::ServiceAccount {
                        account,
                        token: Mutex::new(token),
                    },
                )
            }
        };

        let documents_url = Self::documents_url(&base_url, &project_id, &config.database)?;

        info!(
            project_id = %project_id,
            database = %config.database,
            emulator = config.emulator_host.is_some(),
            "Created Firestore client"
        );

        Ok(Self {
            http,
            documents_url,
            auth,
        })
    }

    /// `{base}/projects/{project}/databases/{database}/documents`
    fn documents_url(base_url: &str, project_id: &str, database: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(base_url).map_err(|e| StoreError::connection(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::connection(format!("cannot use {} as a base", base_url)))?
            .extend(["projects", project_id, "databases", database, "documents"]);
        Ok(url)
    }

    /// Resolve the URL of one document.
    ///
    /// The collection may be a slash-separated path to a subcollection; the
    /// document id must be a single segment.
    fn document_url(&self, collection: &str, document_id: &str) -> Result<Url, StoreError> {
        if document_id.is_empty()
            || document_id.contains('/')
            || document_id == "."
            || document_id == ".."
        {
            return Err(StoreError::invalid_document_id(document_id));
        }

        let mut url = self.documents_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::connection("documents URL cannot be a base"))?;
            segments.extend(collection.split('/').filter(|s| !s.is_empty()));
            segments.push(document_id);
        }
        Ok(url)
    }

    async fn bearer_token(&self) -> Result<String, StoreError> {
        match &self.auth {
            Authenticator::Emulator => Ok(EMULATOR_TOKEN.to_string()),
            Authenticator::ServiceAccount { account, token } => {
                let mut token = token.lock().await;
                if token.expires_within(Duration::seconds(TOKEN_REFRESH_MARGIN_SECS)) {
                    *token = account.fetch_token(&self.http).await?;
                    debug!("Refreshed access token");
                }
                Ok(token.value.clone())
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    /// Overwrite a document.
    ///
    /// Issues a PATCH without an update mask, which Firestore treats as a
    /// full replacement, creating the document if it does not exist.
    #[instrument(skip(self, fields), fields(field_count = fields.len()))]
    async fn set_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let body = json!({ "fields": encode_fields(fields)? });
        let url = self.document_url(collection, document_id)?;
        let token = self.bearer_token().await?;

        let response = self
            .http
            .patch(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Write request failed");
            return Err(StoreError::write(format!(
                "Write failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(collection = %collection, document_id = %document_id, "Document written");
        Ok(())
    }
}
