//! Notion REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Url};
use tracing::{debug, instrument, warn};

use super::models::{CreatePageBody, ErrorBody, Page, PageParent, UpdatePageBody};
use crate::config::{CaptureConfig, DEFAULT_NOTION_API_URL};
use crate::error::RemoteStoreError;
use crate::properties::Properties;
use crate::store::{RecordStore, StoredRecord};

/// API version that supports data source parents.
pub const NOTION_VERSION: &str = "2025-09-03";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Notion REST client.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: Client,
    api_url: String,
}

impl NotionClient {
    /// Create a client against the public Notion API.
    ///
    /// # Arguments
    /// * `api_key` - Notion integration token
    pub fn new(api_key: &str) -> Result<Self, RemoteStoreError> {
        Self::with_url(api_key, DEFAULT_NOTION_API_URL)
    }

    /// Create a client with a custom API base URL (proxies, tests).
    pub fn with_url(api_key: &str, api_url: &str) -> Result<Self, RemoteStoreError> {
        if api_key.trim().is_empty() {
            return Err(RemoteStoreError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| RemoteStoreError::InvalidApiKey(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from capture configuration.
    pub fn from_config(config: &CaptureConfig) -> Result<Self, RemoteStoreError> {
        let api_key = config
            .notion_api_key
            .as_deref()
            .ok_or(RemoteStoreError::MissingApiKey)?;
        Self::with_url(api_key, &config.notion_api_url)
    }

    /// Create a page under a database data source.
    #[instrument(skip(self, properties), fields(data_source_id = %data_source_id))]
    pub async fn create_page(
        &self,
        data_source_id: &str,
        properties: &Properties,
    ) -> Result<Page, RemoteStoreError> {
        let url = format!("{}/v1/pages", self.api_url);
        debug!(url = %url, property_count = properties.len(), "POST request");

        let body = CreatePageBody {
            parent: PageParent::data_source(data_source_id),
            properties,
        };
        self.send(self.client.post(&url).json(&body)).await
    }

    /// Overwrite properties on an existing page.
    #[instrument(skip(self, properties), fields(page_id = %page_id))]
    pub async fn update_page(
        &self,
        page_id: &str,
        properties: &Properties,
    ) -> Result<Page, RemoteStoreError> {
        let url = self.page_url(page_id)?;
        debug!(url = %url, property_count = properties.len(), "PATCH request");

        let body = UpdatePageBody { properties };
        self.send(self.client.patch(url).json(&body)).await
    }

    /// `/v1/pages/{page_id}` with the ID as one percent-encoded segment.
    fn page_url(&self, page_id: &str) -> Result<Url, RemoteStoreError> {
        let page_id = page_id.trim();
        if page_id.is_empty() || matches!(page_id, "." | "..") {
            return Err(RemoteStoreError::InvalidPageId(page_id.to_string()));
        }

        let mut url = Url::parse(&format!("{}/v1/pages", self.api_url))
            .map_err(|e| RemoteStoreError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| RemoteStoreError::InvalidUrl(self.api_url.clone()))?
            .push(page_id);
        Ok(url)
    }

    /// Send a request and parse the page or error body.
    async fn send(&self, request: RequestBuilder) -> Result<Page, RemoteStoreError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse Notion page");
                RemoteStoreError::Serialization(e)
            });
        }

        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => ("unknown".to_string(), text),
        };
        warn!(status = status.as_u16(), code = %code, "Notion API request failed");

        Err(RemoteStoreError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn create_record(
        &self,
        data_source_id: &str,
        properties: Properties,
    ) -> Result<StoredRecord, RemoteStoreError> {
        let page = self.create_page(data_source_id, &properties).await?;
        Ok(StoredRecord {
            id: page.id,
            url: page.url,
        })
    }

    async fn update_record(
        &self,
        record_id: &str,
        properties: Properties,
    ) -> Result<StoredRecord, RemoteStoreError> {
        let page = self.update_page(record_id, &properties).await?;
        Ok(StoredRecord {
            id: page.id,
            url: page.url,
        })
    }
}
