//! Category schema registry.
//!
//! Static, immutable tables: the categories offered to the classifier and
//! the Notion database each one routes to. Nothing here is mutated at
//! runtime.

pub mod categories;
pub mod databases;

pub use categories::{Category, CLASSIFICATION_RULES, CONFIDENCE_THRESHOLD};
pub use databases::{
    extra_field_for_property, property_for_extra_field, topic_schema, topic_schemas, TopicSchema,
    EXTRA_FIELD_MAP, MASTER_DATA_SOURCE_ID, NEEDS_SORTING_DATA_SOURCE_ID,
};
