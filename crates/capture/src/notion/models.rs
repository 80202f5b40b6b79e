//! Notion REST API models.

use serde::{Deserialize, Serialize};

use crate::properties::Properties;

/// Page parent pointing at a database data source.
#[derive(Debug, Serialize)]
pub struct PageParent<'a> {
    /// Parent type (always `data_source_id`).
    #[serde(rename = "type")]
    pub parent_type: &'static str,
    /// Data source ID.
    pub data_source_id: &'a str,
}

impl<'a> PageParent<'a> {
    #[must_use]
    pub fn data_source(data_source_id: &'a str) -> Self {
        Self {
            parent_type: "data_source_id",
            data_source_id,
        }
    }
}

/// Body of `POST /v1/pages`.
#[derive(Debug, Serialize)]
pub struct CreatePageBody<'a> {
    pub parent: PageParent<'a>,
    pub properties: &'a Properties,
}

/// Body of `PATCH /v1/pages/{page_id}`.
#[derive(Debug, Serialize)]
pub struct UpdatePageBody<'a> {
    pub properties: &'a Properties,
}

/// Page object returned by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    /// Page ID (UUID).
    pub id: String,
    /// Public URL of the page.
    pub url: String,
}

/// Error object returned for non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. `validation_error`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}
