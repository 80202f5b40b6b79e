//! Task capture tools for an LLM agent.
//!
//! This crate provides the pieces an agent runtime needs to capture a
//! free-text task, route it into a topic-specific Notion database and never
//! lose it:
//!
//! - [`registry`] - the fixed categories and their Notion database schemas
//! - [`properties`] - flat field maps coerced into Notion property objects
//! - [`notion`] - REST client for page create/update
//! - [`records`] - the master-record / topic-entry operations
//! - [`fallback`] - Google Sheets or local JSONL logging when Notion fails
//! - [`instruction`] - the step-by-step prompt the agent follows
//! - [`tools`] and [`mcp`] - the agent-facing tool contract over MCP stdio
//! - [`flow`] - a deterministic capture sequence for callers that already
//!   know the category
//!
//! # Example
//!
//! ```no_run
//! use capture::{CaptureConfig, NotionClient, Priority, RecordWriter};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CaptureConfig::from_env();
//! let records = RecordWriter::new(NotionClient::from_config(&config)?, &config.source);
//!
//! let master = records
//!     .create_master_record("Pick up dry cleaning", Priority::Medium)
//!     .await?;
//! println!("Master record: {}", master.url);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod flow;
pub mod instruction;
pub mod mcp;
pub mod notion;
pub mod properties;
pub mod records;
pub mod registry;
pub mod store;
pub mod tools;

pub use config::{CaptureConfig, FallbackConfig};
pub use error::{FallbackWriteError, RemoteStoreError};
pub use fallback::{FallbackEntry, FallbackLogger, FallbackOutcome};
pub use flow::{CaptureFlow, CaptureOutcome, CaptureRequest, CaptureStep};
pub use notion::NotionClient;
pub use properties::{build_properties, FieldValue, Fields, Properties, PropertyValue};
pub use records::{
    Confidence, MasterRecord, MasterStatus, MasterUpdate, Priority, RecordWriter, TopicEntry,
    TopicEntryRequest,
};
pub use registry::{Category, TopicSchema};
pub use store::{RecordStore, StoredRecord};
pub use tools::{CaptureTools, ToolError};
