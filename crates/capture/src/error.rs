//! Error types for the capture tools.
//!
//! An unrecognized category is deliberately not an error: it is remapped to
//! the catch-all category (see [`crate::registry::Category::resolve`]).

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the Notion record store.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// `NOTION_API_KEY` is not configured.
    #[error("Notion API key not configured (set NOTION_API_KEY)")]
    MissingApiKey,

    /// The API key cannot be used as a header value.
    #[error("Invalid Notion API key: {0}")]
    InvalidApiKey(String),

    /// Page ID cannot address a single page.
    #[error("Invalid Notion page ID: '{0}'")]
    InvalidPageId(String),

    /// Configured API URL cannot carry a page path.
    #[error("Invalid Notion API URL: {0}")]
    InvalidUrl(String),

    /// HTTP request failed.
    #[error("HTTP request to Notion failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Notion returned a non-success status.
    #[error("Notion API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Response body could not be parsed.
    #[error("Failed to parse Notion response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemoteStoreError {
    /// HTTP status returned by Notion, if the request got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Errors from the last-resort fallback logger.
///
/// These are terminal for a capture attempt: there is nothing further to
/// fall back to.
#[derive(Debug, Error)]
pub enum FallbackWriteError {
    /// Local log file could not be opened or written.
    #[error("Failed to write fallback log {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Entry or credential file (de)serialization failed.
    #[error("Fallback serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Service-account credentials are unusable.
    #[error("Invalid Google service-account credentials: {0}")]
    Credentials(String),

    /// Signing the service-account assertion failed.
    #[error("Failed to sign service-account assertion: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Configured Sheets API URL cannot carry the append path.
    #[error("Invalid Google Sheets API URL: {0}")]
    InvalidUrl(String),

    /// HTTP request to Google failed.
    #[error("HTTP request to Google failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Google returned a non-success status.
    #[error("Google API error: {status} - {message}")]
    Api { status: u16, message: String },
}
