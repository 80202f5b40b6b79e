//! Master-record and topic-entry operations.
//!
//! Each operation is exactly one call to the [`RecordStore`]. There is no
//! retry and no self-fallback: a [`RemoteStoreError`] goes straight back to
//! the caller, which decides whether to invoke the fallback logger. The
//! three operations are not transactional; a failure between them leaves a
//! `Pending` master record behind.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, instrument, warn};

use crate::error::RemoteStoreError;
use crate::properties::{build_properties, FieldValue, Fields};
use crate::registry::{
    property_for_extra_field, topic_schema, Category, TopicSchema, MASTER_DATA_SOURCE_ID,
};
use crate::store::RecordStore;

macro_rules! select_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Select option name stored in Notion.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($label) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!(
                    "invalid {} '{s}', expected one of: {}",
                    stringify!($name).to_lowercase(),
                    [$($label),+].join(", ")
                ))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

select_enum!(
    /// Task priority.
    Priority {
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
);

select_enum!(
    /// Classification confidence.
    Confidence {
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
);

select_enum!(
    /// Status of a master record.
    MasterStatus {
        Pending => "Pending",
        Routed => "Routed",
        NeedsSorting => "Needs Sorting",
    }
);

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::High
    }
}

impl MasterStatus {
    /// Status a master record gets once routed to `category`.
    #[must_use]
    pub fn after_routing(category: Category) -> Self {
        if category.is_catch_all() {
            Self::NeedsSorting
        } else {
            Self::Routed
        }
    }
}

/// Result of creating a master record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub page_id: String,
    pub url: String,
}

/// Result of creating a topic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub page_id: String,
    pub url: String,
    /// Name of the database the entry landed in.
    pub database_name: String,
}

/// Result of updating a master record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterUpdate {
    pub updated: bool,
    pub page_id: String,
    pub status: MasterStatus,
}

/// Arguments for [`RecordWriter::create_topic_entry`].
#[derive(Debug, Clone, Default)]
pub struct TopicEntryRequest {
    /// Category name as classified; unknown names route to Needs Sorting.
    pub category: String,
    pub title: String,
    pub priority: Priority,
    /// Written as `Notes` when non-empty.
    pub notes: String,
    /// Agent-facing extra field names (e.g. `cost_estimate`).
    pub extra_fields: BTreeMap<String, FieldValue>,
}

impl TopicEntryRequest {
    #[must_use]
    pub fn new(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
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

/// Merge defaults, request values and translated extra fields for a topic
/// database.
///
/// Extra fields not in the translation table, and blank values, are dropped.
/// A numeric zero is a value and is kept.
#[must_use]
pub fn topic_fields(schema: &TopicSchema, request: &TopicEntryRequest) -> Fields {
    let mut fields: Fields = schema
        .defaults
        .iter()
        .map(|(name, value)| ((*name).to_string(), FieldValue::from(*value)))
        .collect();

    fields.insert("Task".to_string(), FieldValue::from(request.title.as_str()));

    if !schema.category.is_catch_all() {
        fields.insert(
            "Priority".to_string(),
            FieldValue::from(request.priority.as_str()),
        );
    }

    if !request.notes.is_empty() {
        fields.insert("Notes".to_string(), FieldValue::from(request.notes.as_str()));
    }

    for (key, value) in &request.extra_fields {
        match property_for_extra_field(key) {
            Some(property) if !value.is_blank() => {
                fields.insert(property.to_string(), value.clone());
            }
            Some(_) => {}
            None => tracing::debug!(field = %key, "Dropping unrecognized extra field"),
        }
    }

    fields
}

/// Writes master records and topic entries through a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct RecordWriter<S> {
    store: S,
    source: String,
}

impl<S: RecordStore> RecordWriter<S> {
    /// Create a writer tagging master records with `source`.
    pub fn new(store: S, source: impl Into<String>) -> Self {
        Self {
            store,
            source: source.into(),
        }
    }

    /// Create the audit-trail record with status `Pending`.
    ///
    /// Call this before classification.
    #[instrument(skip(self))]
    pub async fn create_master_record(
        &self,
        title: &str,
        priority: Priority,
    ) -> Result<MasterRecord, RemoteStoreError> {
        let mut fields = Fields::new();
        fields.insert("Task".to_string(), title.into());
        fields.insert("Source".to_string(), self.source.as_str().into());
        fields.insert("Status".to_string(), MasterStatus::Pending.as_str().into());
        fields.insert("Priority".to_string(), priority.as_str().into());

        let record = self
            .store
            .create_record(MASTER_DATA_SOURCE_ID, build_properties(&fields))
            .await?;

        info!(page_id = %record.id, "Created master record");
        Ok(MasterRecord {
            page_id: record.id,
            url: record.url,
        })
    }

    /// Route a classified task to its topic database.
    ///
    /// An unrecognized category silently resolves to Needs Sorting; the
    /// returned `database_name` shows where the entry actually went.
    #[instrument(skip(self, request), fields(category = %request.category))]
    pub async fn create_topic_entry(
        &self,
        request: &TopicEntryRequest,
    ) -> Result<TopicEntry, RemoteStoreError> {
        let schema = topic_schema(Category::resolve(&request.category));
        let fields = topic_fields(schema, request);

        let missing = schema.missing_required(&fields);
        if !missing.is_empty() {
            warn!(database = schema.name, ?missing, "Topic entry lacks required fields");
        }

        let record = self
            .store
            .create_record(schema.data_source_id, build_properties(&fields))
            .await?;

        info!(page_id = %record.id, database = schema.name, "Created topic entry");
        Ok(TopicEntry {
            page_id: record.id,
            url: record.url,
            database_name: schema.name.to_string(),
        })
    }

    /// Link the master record to its topic entry and set the final status.
    #[instrument(skip(self, topic_link))]
    pub async fn update_master_record(
        &self,
        page_id: &str,
        status: MasterStatus,
        category: &str,
        topic_link: &str,
        confidence: Confidence,
    ) -> Result<MasterUpdate, RemoteStoreError> {
        let mut fields = Fields::new();
        fields.insert("Status".to_string(), status.as_str().into());
        fields.insert("Category".to_string(), category.into());
        fields.insert("Topic Link".to_string(), topic_link.into());
        fields.insert("Confidence".to_string(), confidence.as_str().into());

        self.store
            .update_record(page_id, build_properties(&fields))
            .await?;

        info!(page_id = %page_id, "Updated master record");
        Ok(MasterUpdate {
            updated: true,
            page_id: page_id.to_string(),
            status,
        })
    }
}
