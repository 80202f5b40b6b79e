//! Google Sheets fallback: service-account auth and row append.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::config::DEFAULT_SHEETS_API_URL;
use crate::error::FallbackWriteError;

/// OAuth scope for reading and writing spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Token endpoint used when the key file doesn't name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fields of a Google service-account JSON key.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    /// Load a key file.
    pub async fn from_file(path: &Path) -> Result<Self, FallbackWriteError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| FallbackWriteError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::from_json(&content)
    }

    /// Parse a key from its JSON text.
    pub fn from_json(content: &str) -> Result<Self, FallbackWriteError> {
        let key: Self = serde_json::from_str(content)
            .map_err(|e| FallbackWriteError::Credentials(e.to_string()))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(FallbackWriteError::Credentials(
                "client_email and private_key are required".to_string(),
            ));
        }
        Ok(key)
    }
}

/// JWT claims for the OAuth 2.0 service-account flow.
#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Minimal Google Sheets client for appending rows.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    api_url: String,
    key: ServiceAccountKey,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self, FallbackWriteError> {
        Self::with_url(key, DEFAULT_SHEETS_API_URL)
    }

    /// Create a client with a custom Sheets API base URL.
    pub fn with_url(key: ServiceAccountKey, api_url: &str) -> Result<Self, FallbackWriteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            key,
        })
    }

    /// Sign an RS256 assertion for the service account.
    fn assertion(&self) -> Result<String, FallbackWriteError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }

    /// Exchange a signed assertion for an access token.
    async fn access_token(&self) -> Result<String, FallbackWriteError> {
        let assertion = self.assertion()?;
        debug!(token_uri = %self.key.token_uri, "Requesting Google access token");

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Google token exchange failed");
            return Err(FallbackWriteError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// `/v4/spreadsheets/{id}/values/{range}:append` with each part encoded
    /// as one path segment.
    fn append_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, FallbackWriteError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| FallbackWriteError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| FallbackWriteError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values"])
            .push(&format!("{range}:append"));
        Ok(url)
    }

    /// Append one row after the last row of the table at `range`.
    #[instrument(skip(self, row))]
    pub async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<(), FallbackWriteError> {
        let url = self.append_url(spreadsheet_id, range)?;
        let token = self.access_token().await?;
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row] }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Sheets append failed");
            Err(FallbackWriteError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
