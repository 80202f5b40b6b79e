//! Agent-facing tool contract.
//!
//! Four tools, invoked by the agent runtime per the orchestration
//! instruction:
//!
//! - `create_master_record(title, priority?)` → `{page_id, url}`
//! - `create_topic_entry(category, title, priority?, notes?, ...extra)` →
//!   `{page_id, url, database_name}`
//! - `update_master_record(page_id, status, category, topic_link,
//!   confidence?)` → `{updated, page_id, status}`
//! - `log_fallback(title, category?, priority?, error_message?)` →
//!   `{logged_to, path | sheet_id}`

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::{FallbackWriteError, RemoteStoreError};
use crate::fallback::{FallbackLogger, UNKNOWN_CATEGORY};
use crate::properties::FieldValue;
use crate::records::{Confidence, MasterStatus, Priority, RecordWriter, TopicEntryRequest};
use crate::registry::{Category, EXTRA_FIELD_MAP};
use crate::store::RecordStore;

pub const CREATE_MASTER_RECORD: &str = "create_master_record";
pub const CREATE_TOPIC_ENTRY: &str = "create_topic_entry";
pub const UPDATE_MASTER_RECORD: &str = "update_master_record";
pub const LOG_FALLBACK: &str = "log_fallback";

/// Errors surfaced to the agent from a tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    RemoteStore(#[from] RemoteStoreError),

    #[error(transparent)]
    FallbackWrite(#[from] FallbackWriteError),
}

#[derive(Debug, Deserialize)]
struct CreateMasterRecordArgs {
    title: String,
    #[serde(default)]
    priority: Priority,
}

#[derive(Debug, Deserialize)]
struct CreateTopicEntryArgs {
    category: String,
    title: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    notes: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UpdateMasterRecordArgs {
    page_id: String,
    status: MasterStatus,
    category: String,
    topic_link: String,
    #[serde(default)]
    confidence: Confidence,
}

#[derive(Debug, Deserialize)]
struct LogFallbackArgs {
    title: String,
    #[serde(default = "unknown_category")]
    category: String,
    #[serde(default = "medium_priority")]
    priority: String,
    #[serde(default)]
    error_message: String,
}

fn unknown_category() -> String {
    UNKNOWN_CATEGORY.to_string()
}

fn medium_priority() -> String {
    Priority::Medium.to_string()
}

fn parse_args<T: for<'de> Deserialize<'de>>(args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Record-store and fallback operations exposed as agent tools.
#[derive(Debug, Clone)]
pub struct CaptureTools<S> {
    records: RecordWriter<S>,
    fallback: FallbackLogger,
}

impl<S: RecordStore> CaptureTools<S> {
    pub fn new(records: RecordWriter<S>, fallback: FallbackLogger) -> Self {
        Self { records, fallback }
    }

    /// Dispatch a tool call by name. Returns the tool's JSON result.
    pub async fn call(&self, name: &str, args: &Value) -> Result<Value, ToolError> {
        debug!(tool = name, "Tool call");
        match name {
            CREATE_MASTER_RECORD => {
                let args: CreateMasterRecordArgs = parse_args(args)?;
                let master = self
                    .records
                    .create_master_record(&args.title, args.priority)
                    .await?;
                Ok(json!(master))
            }
            CREATE_TOPIC_ENTRY => {
                let args: CreateTopicEntryArgs = parse_args(args)?;
                let request = TopicEntryRequest {
                    category: args.category,
                    title: args.title,
                    priority: args.priority,
                    notes: args.notes.unwrap_or_default(),
                    extra_fields: args
                        .extra
                        .iter()
                        .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                        .collect(),
                };
                let entry = self.records.create_topic_entry(&request).await?;
                Ok(json!(entry))
            }
            UPDATE_MASTER_RECORD => {
                let args: UpdateMasterRecordArgs = parse_args(args)?;
                let update = self
                    .records
                    .update_master_record(
                        &args.page_id,
                        args.status,
                        &args.category,
                        &args.topic_link,
                        args.confidence,
                    )
                    .await?;
                Ok(json!(update))
            }
            LOG_FALLBACK => {
                let args: LogFallbackArgs = parse_args(args)?;
                let outcome = self
                    .fallback
                    .log(&args.title, &args.category, &args.priority, &args.error_message)
                    .await?;
                Ok(json!(outcome))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// Tool definitions in MCP `tools/list` form.
#[must_use]
pub fn tool_definitions() -> Value {
    let levels = ["High", "Medium", "Low"];
    let categories: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();

    let mut topic_properties = Map::new();
    topic_properties.insert(
        "category".to_string(),
        json!({
            "type": "string",
            "description": "The classified category. Unrecognized names are routed to Needs Sorting.",
            "enum": categories
        }),
    );
    topic_properties.insert(
        "title".to_string(),
        json!({"type": "string", "description": "The task text"}),
    );
    topic_properties.insert(
        "priority".to_string(),
        json!({"type": "string", "enum": levels, "default": "Medium"}),
    );
    topic_properties.insert(
        "notes".to_string(),
        json!({"type": "string", "description": "Optional additional context"}),
    );
    for (external, property) in EXTRA_FIELD_MAP {
        let value_type = if *external == "cost_estimate" {
            json!(["number", "string"])
        } else {
            json!("string")
        };
        topic_properties.insert(
            (*external).to_string(),
            json!({
                "type": value_type,
                "description": format!("Optional, stored as '{property}'")
            }),
        );
    }

    json!({
        "tools": [
            {
                "name": CREATE_MASTER_RECORD,
                "description": "Create a record in the master intake database with status Pending. Call this FIRST, before classification. It is the audit trail so no captured task is ever lost.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "The raw task text from the user"},
                        "priority": {"type": "string", "enum": levels, "default": "Medium"}
                    },
                    "required": ["title"]
                }
            },
            {
                "name": CREATE_TOPIC_ENTRY,
                "description": "Route the task to the topic-specific Notion database for its category. Call this AFTER classification.",
                "inputSchema": {
                    "type": "object",
                    "properties": topic_properties,
                    "required": ["category", "title"]
                }
            },
            {
                "name": UPDATE_MASTER_RECORD,
                "description": "Update the master intake record after routing: link it to the topic entry and set the final status.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "page_id": {"type": "string", "description": "Master record page ID from create_master_record"},
                        "status": {"type": "string", "enum": ["Routed", "Needs Sorting"]},
                        "category": {"type": "string", "description": "The classified category name"},
                        "topic_link": {"type": "string", "description": "URL of the topic database entry"},
                        "confidence": {"type": "string", "enum": levels, "default": "High"}
                    },
                    "required": ["page_id", "status", "category", "topic_link"]
                }
            },
            {
                "name": LOG_FALLBACK,
                "description": "Log the task to the fallback log when a Notion call fails. Call it only after create_master_record, create_topic_entry or update_master_record returned an error.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "The raw task text"},
                        "category": {"type": "string", "default": UNKNOWN_CATEGORY},
                        "priority": {"type": "string", "default": "Medium"},
                        "error_message": {"type": "string", "description": "The error that triggered the fallback"}
                    },
                    "required": ["title"]
                }
            }
        ]
    })
}
