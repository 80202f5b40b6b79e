//! Local append-only JSONL fallback log.

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::FallbackEntry;
use crate::error::FallbackWriteError;

/// Append one entry as a single JSON line.
///
/// The file is created if missing; its parent directory is not.
pub async fn append_entry(path: &Path, entry: &FallbackEntry) -> Result<(), FallbackWriteError> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let io_err = |source| FallbackWriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_err)?;
    file.write_all(line.as_bytes()).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;

    debug!(path = %path.display(), "Appended fallback entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fallback_log.jsonl");

        let first = FallbackEntry::new("First", "Personal", "High", "Notion 503", "Test");
        let second = FallbackEntry::new("Second", "Unknown", "Medium", "timeout", "Test");
        append_entry(&path, &first).await.unwrap();
        append_entry(&path, &second).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["title"], "Second");
        assert_eq!(parsed["error"], "timeout");
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("fallback_log.jsonl");
        let entry = FallbackEntry::new("Lost?", "Unknown", "Medium", "boom", "Test");

        let err = append_entry(&path, &entry).await.unwrap_err();
        assert!(matches!(err, FallbackWriteError::Io { .. }));
    }
}
