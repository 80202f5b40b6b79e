//! Configuration for the capture tools, read from the process environment.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default source tag written on master records and fallback entries.
pub const DEFAULT_SOURCE: &str = "Task Capture Agent";

/// Default Notion API base URL.
pub const DEFAULT_NOTION_API_URL: &str = "https://api.notion.com";

/// Default Google Sheets API base URL.
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Default local fallback file, relative to the working directory.
pub const DEFAULT_FALLBACK_LOG: &str = "fallback_log.jsonl";

/// Default append range (first sheet of the spreadsheet).
pub const DEFAULT_SHEETS_RANGE: &str = "A1";

/// Capture tools configuration.
#[derive(Clone)]
pub struct CaptureConfig {
    /// Notion integration token.
    pub notion_api_key: Option<String>,
    /// Notion API base URL.
    pub notion_api_url: String,
    /// Source tag recorded on master records and fallback entries.
    pub source: String,
    /// Fallback logging configuration.
    pub fallback: FallbackConfig,
}

impl CaptureConfig {
    /// Read configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            notion_api_key: non_empty_var("NOTION_API_KEY"),
            notion_api_url: non_empty_var("NOTION_API_URL")
                .unwrap_or_else(|| DEFAULT_NOTION_API_URL.to_string()),
            source: non_empty_var("CAPTURE_SOURCE").unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            fallback: FallbackConfig::from_env(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for CaptureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureConfig")
            .field(
                "notion_api_key",
                &self.notion_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("notion_api_url", &self.notion_api_url)
            .field("source", &self.source)
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Fallback logger configuration.
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Path to the Google service-account JSON key.
    pub sheets_credentials_path: Option<PathBuf>,
    /// Target spreadsheet ID.
    pub sheets_id: Option<String>,
    /// A1 range rows are appended to.
    pub sheets_range: String,
    /// Google Sheets API base URL.
    pub sheets_api_url: String,
    /// Local append-only JSONL file used when Sheets is not configured.
    pub local_log_path: PathBuf,
}

impl FallbackConfig {
    /// Read fallback configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            sheets_credentials_path: non_empty_var("GOOGLE_SHEETS_CREDENTIALS_PATH")
                .map(PathBuf::from),
            sheets_id: non_empty_var("GOOGLE_SHEETS_FALLBACK_ID"),
            sheets_range: non_empty_var("GOOGLE_SHEETS_FALLBACK_RANGE")
                .unwrap_or_else(|| DEFAULT_SHEETS_RANGE.to_string()),
            sheets_api_url: non_empty_var("GOOGLE_SHEETS_API_URL")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_URL.to_string()),
            local_log_path: non_empty_var("CAPTURE_FALLBACK_LOG")
                .map_or_else(|| PathBuf::from(DEFAULT_FALLBACK_LOG), PathBuf::from),
        }
    }

    /// Local-file-only configuration.
    #[must_use]
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            sheets_credentials_path: None,
            sheets_id: None,
            sheets_range: DEFAULT_SHEETS_RANGE.to_string(),
            sheets_api_url: DEFAULT_SHEETS_API_URL.to_string(),
            local_log_path: path.into(),
        }
    }

    /// Credentials path and spreadsheet ID, when both are configured.
    #[must_use]
    pub fn sheets(&self) -> Option<(&Path, &str)> {
        match (&self.sheets_credentials_path, &self.sheets_id) {
            (Some(path), Some(id)) => Some((path.as_path(), id.as_str())),
            _ => None,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}
