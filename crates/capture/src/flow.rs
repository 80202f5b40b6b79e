//! Deterministic capture sequence for callers that already know the
//! category.
//!
//! Mirrors what the agent does under the orchestration instruction: master
//! record, topic entry, master update. The first Notion failure stops the
//! sequence and the task is written to the fallback log exactly once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{FallbackWriteError, RemoteStoreError};
use crate::fallback::{FallbackLogger, FallbackOutcome};
use crate::properties::FieldValue;
use crate::records::{
    Confidence, MasterRecord, MasterStatus, MasterUpdate, Priority, RecordWriter, TopicEntry,
    TopicEntryRequest,
};
use crate::registry::Category;
use crate::store::RecordStore;

/// A task to capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureRequest {
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub confidence: Confidence,
    pub notes: String,
    pub extra_fields: BTreeMap<String, FieldValue>,
}

impl CaptureRequest {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra_fields.insert(key.into(), value.into());
        self
    }
}

/// Step of the capture sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStep {
    CreateMasterRecord,
    CreateTopicEntry,
    UpdateMasterRecord,
}

impl CaptureStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateMasterRecord => "create_master_record",
            Self::CreateTopicEntry => "create_topic_entry",
            Self::UpdateMasterRecord => "update_master_record",
        }
    }
}

impl fmt::Display for CaptureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a capture ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// All three Notion writes succeeded.
    Routed {
        master: MasterRecord,
        entry: TopicEntry,
        update: MasterUpdate,
    },
    /// A Notion write failed and the task went to the fallback log.
    FellBack {
        failed_step: CaptureStep,
        error: String,
        fallback: FallbackOutcome,
        /// Master record left `Pending`, if it was created.
        master_page_id: Option<String>,
    },
}

impl CaptureOutcome {
    #[must_use]
    pub fn is_routed(&self) -> bool {
        matches!(self, Self::Routed { .. })
    }
}

/// Runs the capture sequence with the fallback policy.
#[derive(Debug, Clone)]
pub struct CaptureFlow<S> {
    records: RecordWriter<S>,
    fallback: FallbackLogger,
}

impl<S: RecordStore> CaptureFlow<S> {
    pub fn new(records: RecordWriter<S>, fallback: FallbackLogger) -> Self {
        Self { records, fallback }
    }

    /// Capture one task.
    ///
    /// Only a fallback write failure is returned as `Err`; Notion failures
    /// are reported through [`CaptureOutcome::FellBack`].
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn capture(
        &self,
        request: &CaptureRequest,
    ) -> Result<CaptureOutcome, FallbackWriteError> {
        let master = match self
            .records
            .create_master_record(&request.title, request.priority)
            .await
        {
            Ok(master) => master,
            Err(e) => {
                return self
                    .fall_back(request, CaptureStep::CreateMasterRecord, &e, None)
                    .await
            }
        };

        let topic_request = TopicEntryRequest {
            category: request.category.clone(),
            title: request.title.clone(),
            priority: request.priority,
            notes: request.notes.clone(),
            extra_fields: request.extra_fields.clone(),
        };
        let entry = match self.records.create_topic_entry(&topic_request).await {
            Ok(entry) => entry,
            Err(e) => {
                return self
                    .fall_back(
                        request,
                        CaptureStep::CreateTopicEntry,
                        &e,
                        Some(master.page_id),
                    )
                    .await
            }
        };

        let category = Category::resolve(&request.category);
        let update = match self
            .records
            .update_master_record(
                &master.page_id,
                MasterStatus::after_routing(category),
                category.as_str(),
                &entry.url,
                request.confidence,
            )
            .await
        {
            Ok(update) => update,
            Err(e) => {
                return self
                    .fall_back(
                        request,
                        CaptureStep::UpdateMasterRecord,
                        &e,
                        Some(master.page_id),
                    )
                    .await
            }
        };

        info!(database = %entry.database_name, "Task captured");
        Ok(CaptureOutcome::Routed {
            master,
            entry,
            update,
        })
    }

    async fn fall_back(
        &self,
        request: &CaptureRequest,
        failed_step: CaptureStep,
        error: &RemoteStoreError,
        master_page_id: Option<String>,
    ) -> Result<CaptureOutcome, FallbackWriteError> {
        warn!(step = %failed_step, error = %error, "Notion write failed, logging to fallback");
        let error = error.to_string();
        let fallback = self
            .fallback
            .log(
                &request.title,
                &request.category,
                request.priority.as_str(),
                &error,
            )
            .await?;

        Ok(CaptureOutcome::FellBack {
            failed_step,
            error,
            fallback,
            master_page_id,
        })
    }
}
