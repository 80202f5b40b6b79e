//! Coercion of flat field maps into Notion property objects.
//!
//! The property type is chosen per field name and value type:
//!
//! | Field / value                   | Notion type |
//! |---------------------------------|-------------|
//! | `Task` (any value)              | `title`     |
//! | number                          | `number`    |
//! | string in [`SELECT_FIELDS`]     | `select`    |
//! | any other string                | `rich_text` |
//! | null                            | omitted     |
//!
//! No schema validation happens here; see
//! [`TopicSchema::missing_required`](crate::registry::TopicSchema::missing_required).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Field that always becomes the page title.
pub const TITLE_FIELD: &str = "Task";

/// Fields whose string values are single-choice selects.
pub const SELECT_FIELDS: &[&str] = &[
    "Status",
    "Priority",
    "Category",
    "Source",
    "Area",
    "Platform",
    "Type",
    "Class",
    "Confidence",
];

/// Notion's limit on a single rich text object's content.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Flat field name to value map.
pub type Fields = BTreeMap<String, FieldValue>;

/// Notion property name to typed property map.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Value of a flat field before coercion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Absent value; never written.
    #[default]
    Null,
    Number(Number),
    Text(String),
}

impl FieldValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value carries nothing worth writing (null or empty text).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Convert a JSON value from a tool call.
    ///
    /// Booleans, arrays and objects are kept as their JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Typed Notion property value.
///
/// Serializes to Notion's wire shape, e.g. `{"select": {"name": "High"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(Number),
    Select(SelectOption),
}

/// Rich text object (plain text only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: TextContent,
}

/// Text content of a rich text object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

/// Select option reference by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

impl PropertyValue {
    #[must_use]
    pub fn title(content: &str) -> Self {
        Self::Title(rich_text_segments(content))
    }

    #[must_use]
    pub fn rich_text(content: &str) -> Self {
        Self::RichText(rich_text_segments(content))
    }

    #[must_use]
    pub fn select(name: &str) -> Self {
        Self::Select(SelectOption {
            name: name.to_string(),
        })
    }

    /// Plain text of a title or rich text property.
    #[must_use]
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Self::Title(parts) | Self::RichText(parts) => {
                Some(parts.iter().map(|p| p.text.content.as_str()).collect())
            }
            Self::Select(option) => Some(option.name.clone()),
            Self::Number(_) => None,
        }
    }
}

/// Split text into rich text objects within Notion's per-object limit.
fn rich_text_segments(content: &str) -> Vec<RichText> {
    if content.chars().count() <= MAX_TEXT_CHARS {
        return vec![RichText {
            text: TextContent {
                content: content.to_string(),
            },
        }];
    }

    let chars: Vec<char> = content.chars().collect();
    chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| RichText {
            text: TextContent {
                content: chunk.iter().collect(),
            },
        })
        .collect()
}

/// Coerce a single field. Returns `None` for null values.
#[must_use]
pub fn coerce(name: &str, value: &FieldValue) -> Option<PropertyValue> {
    match value {
        FieldValue::Null => None,
        _ if name == TITLE_FIELD => Some(PropertyValue::title(&value.to_string())),
        FieldValue::Number(n) => Some(PropertyValue::Number(n.clone())),
        FieldValue::Text(s) if SELECT_FIELDS.contains(&name) => Some(PropertyValue::select(s)),
        FieldValue::Text(s) => Some(PropertyValue::rich_text(s)),
    }
}

/// Convert a flat field map into Notion properties, dropping nulls.
#[must_use]
pub fn build_properties(fields: &Fields) -> Properties {
    fields
        .iter()
        .filter_map(|(name, value)| coerce(name, value).map(|prop| (name.clone(), prop)))
        .collect()
}
