//! Notion integration.
//!
//! Implements [`RecordStore`](crate::store::RecordStore) against the Notion
//! pages API. Pages are created under database *data sources*
//! (`parent.data_source_id`), which requires API version `2025-09-03`.

mod client;
pub mod models;

pub use client::{NotionClient, NOTION_VERSION};
