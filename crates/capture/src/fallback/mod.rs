//! Last-resort logging for tasks Notion could not store.
//!
//! When both `GOOGLE_SHEETS_CREDENTIALS_PATH` and `GOOGLE_SHEETS_FALLBACK_ID`
//! are configured, entries are appended as spreadsheet rows. Otherwise they
//! are appended as JSON lines to a local file. Either way the write is
//! best-effort and immediate; a failure here is returned to the caller and
//! nothing further is attempted.

pub mod local;
pub mod sheets;

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::FallbackConfig;
use crate::error::FallbackWriteError;
use sheets::{ServiceAccountKey, SheetsClient};

/// Category recorded when classification never happened.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Status written in the spreadsheet's status column.
pub const PENDING_STATUS: &str = "Pending";

/// A task that could not be written to Notion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackEntry {
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub category: String,
    pub priority: String,
    pub error: String,
    pub source: String,
}

impl FallbackEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        priority: impl Into<String>,
        error: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            title: title.into(),
            category: category.into(),
            priority: priority.into(),
            error: error.into(),
            source: source.into(),
        }
    }

    /// Spreadsheet row: timestamp, title, category, priority, source,
    /// status, error.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.title.clone(),
            self.category.clone(),
            self.priority.clone(),
            self.source.clone(),
            PENDING_STATUS.to_string(),
            self.error.clone(),
        ]
    }
}

/// Where a fallback entry was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "logged_to", rename_all = "snake_case")]
pub enum FallbackOutcome {
    LocalFile { path: PathBuf },
    Spreadsheet { sheet_id: String },
}

/// Writes fallback entries to Sheets or a local JSONL file.
#[derive(Debug, Clone)]
pub struct FallbackLogger {
    config: FallbackConfig,
    source: String,
}

impl FallbackLogger {
    pub fn new(config: FallbackConfig, source: impl Into<String>) -> Self {
        Self {
            config,
            source: source.into(),
        }
    }

    /// Whether entries go to a spreadsheet rather than the local file.
    #[must_use]
    pub fn uses_spreadsheet(&self) -> bool {
        self.config.sheets().is_some()
    }

    /// Record a task that failed to reach Notion.
    pub async fn log(
        &self,
        title: &str,
        category: &str,
        priority: &str,
        error_message: &str,
    ) -> Result<FallbackOutcome, FallbackWriteError> {
        let entry = FallbackEntry::new(title, category, priority, error_message, &self.source);
        self.write(&entry).await
    }

    /// Write a prepared entry.
    #[instrument(skip(self, entry), fields(title = %entry.title))]
    pub async fn write(&self, entry: &FallbackEntry) -> Result<FallbackOutcome, FallbackWriteError> {
        let Some((credentials_path, sheet_id)) = self.config.sheets() else {
            let path = &self.config.local_log_path;
            local::append_entry(path, entry).await?;
            info!(path = %path.display(), "Task logged to local fallback file");
            return Ok(FallbackOutcome::LocalFile { path: path.clone() });
        };

        let key = ServiceAccountKey::from_file(credentials_path).await?;
        let client = SheetsClient::with_url(key, &self.config.sheets_api_url)?;
        client
            .append_row(sheet_id, &self.config.sheets_range, &entry.to_row())
            .await?;

        info!(sheet_id = %sheet_id, "Task logged to fallback spreadsheet");
        Ok(FallbackOutcome::Spreadsheet {
            sheet_id: sheet_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_layout() {
        let entry = FallbackEntry::new("Buy milk", "Personal", "High", "Notion 503", "Agent");
        let row = entry.to_row();
        assert_eq!(row.len(), 7);
        assert_eq!(&row[1..], ["Buy milk", "Personal", "High", "Agent", "Pending", "Notion 503"]);
        assert!(row[0].ends_with('Z'));
    }

    #[test]
    fn test_outcome_shape() {
        let local = FallbackOutcome::LocalFile {
            path: PathBuf::from("fallback_log.jsonl"),
        };
        assert_eq!(
            serde_json::to_value(&local).unwrap(),
            json!({"logged_to": "local_file", "path": "fallback_log.jsonl"})
        );

        let sheet = FallbackOutcome::Spreadsheet {
            sheet_id: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&sheet).unwrap(),
            json!({"logged_to": "spreadsheet", "sheet_id": "abc"})
        );
    }

    #[test]
    fn test_local_config_skips_spreadsheet() {
        let logger = FallbackLogger::new(FallbackConfig::local("log.jsonl"), "Agent");
        assert!(!logger.uses_spreadsheet());
    }
}
