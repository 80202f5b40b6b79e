//! Record store abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteStoreError;
use crate::properties::Properties;

/// A record written to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Record (page) ID.
    pub id: String,
    /// Link to the record.
    pub url: String,
}

/// Structured-record store the capture operations write to.
///
/// Each call is a single remote request; implementations must not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record under the given data source.
    async fn create_record(
        &self,
        data_source_id: &str,
        properties: Properties,
    ) -> Result<StoredRecord, RemoteStoreError>;

    /// Overwrite properties on an existing record.
    async fn update_record(
        &self,
        record_id: &str,
        properties: Properties,
    ) -> Result<StoredRecord, RemoteStoreError>;
}
