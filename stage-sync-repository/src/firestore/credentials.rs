//! Service-account authentication.
//!
//! Exchanges a self-signed RS256 JWT for a short-lived OAuth2 access token
//! (the JWT bearer grant, RFC 7523).

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::StoreError;

/// OAuth2 scope granting read/write access to Firestore.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// The subset of a service-account key file the uploader needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// A bearer token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// True when the token expires within `margin` from now.
    pub fn expires_within(&self, margin: Duration) -> bool {
        Utc::now() + margin >= self.expires_at
    }
}

/// A loaded service account with its signing key ready.
pub struct ServiceAccount {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.key.client_email)
            .field("project_id", &self.key.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Read and validate a key file. Nothing touches the network here.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StoreError::credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            StoreError::credentials(format!("malformed key file {}: {}", path.display(), e))
        })?;
        Self::from_key(key)
    }

    /// Build from an already parsed key.
    pub fn from_key(key: ServiceAccountKey) -> Result<Self, StoreError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::credentials(format!("invalid private key: {}", e)))?;
        Ok(Self { key, signing_key })
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Sign the assertion presented to the token endpoint.
    pub(crate) fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = Claims {
            iss: self.key.client_email.clone(),
            scope: DATASTORE_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.signing_key)
            .map_err(|e| StoreError::credentials(format!("failed to sign assertion: {}", e)))
    }

    /// Exchange a fresh assertion for an access token.
    pub async fn fetch_token(&self, http: &reqwest::Client) -> Result<AccessToken, StoreError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        let response = http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Token request failed");
            return Err(StoreError::auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::auth(format!("unreadable token response: {}", e)))?;

        debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Obtained access token"
        );

        let expires_at = Duration::try_seconds(token.expires_in)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                StoreError::auth(format!("token expires_in out of range: {}", token.expires_in))
            })?;

        Ok(AccessToken {
            value: token.access_token,
            expires_at,
        })
    }
}
