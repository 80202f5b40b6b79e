//! Notion data sources and the properties each one expects.

use super::categories::Category;
use crate::properties::Fields;

/// Data source of the master intake database (one row per captured task).
pub const MASTER_DATA_SOURCE_ID: &str = "c20d0a8a-48eb-4556-824a-8db6d41afabd";

/// Data source of the catch-all database.
pub const NEEDS_SORTING_DATA_SOURCE_ID: &str = "f1a5fa34-3113-4212-b12c-1c1a5fa58955";

/// Schema of a topic-specific Notion database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSchema {
    /// Category routed to this database.
    pub category: Category,
    /// Notion data source ID used as the page parent.
    pub data_source_id: &'static str,
    /// Database name reported back to the agent.
    pub name: &'static str,
    /// Properties every entry should carry.
    pub required_fields: &'static [&'static str],
    /// Domain-specific properties the agent may fill in.
    pub optional_fields: &'static [&'static str],
    /// Values merged in before anything the caller supplies.
    pub defaults: &'static [(&'static str, &'static str)],
}

const TOPIC_REQUIRED: &[&str] = &["Task", "Priority", "Status"];
const TOPIC_DEFAULTS: &[(&str, &str)] = &[("Priority", "Medium"), ("Status", "To Do")];

static TOPIC_SCHEMAS: [TopicSchema; 9] = [
    TopicSchema {
        category: Category::ShoppingErrands,
        data_source_id: "4601cd6c-0145-43bb-842f-5aa0ea21e3f2",
        name: "Shopping & Errands",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Location", "Cost Estimate", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::TechnicalDev,
        data_source_id: "91b88e19-dcde-43b2-a969-d713b3dfd28d",
        name: "Technical Tasks",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Project", "Repo", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::ClassStudy,
        data_source_id: "3c36c983-099b-48e5-9484-5b878bdd95bb",
        name: "Study To-Dos",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Class", "Topic", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::ContentWriting,
        data_source_id: "8dea9c69-3698-4b10-9f04-d8fd629e1937",
        name: "Content Pipeline",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Platform", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::BusinessSales,
        data_source_id: "4953aef4-0aad-4021-a47a-f463f64587bb",
        name: "Business Tasks",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Company", "Contact", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::Personal,
        data_source_id: "37eab999-4369-4842-bdf6-6dda3be3142e",
        name: "Personal To-Dos",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Area", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::WorkflowProcess,
        data_source_id: "dece1175-e5bc-4562-995e-afb6edc4ff9a",
        name: "Workflow Tasks",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Workflow", "Type", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::SocialCommunity,
        data_source_id: "541404e0-43a5-4722-8d4d-d298ab9d8ed9",
        name: "Social & Community",
        required_fields: TOPIC_REQUIRED,
        optional_fields: &["Event / Group", "Location", "Notes"],
        defaults: TOPIC_DEFAULTS,
    },
    TopicSchema {
        category: Category::NeedsSorting,
        data_source_id: NEEDS_SORTING_DATA_SOURCE_ID,
        name: "Needs Sorting",
        required_fields: &["Task", "Status"],
        optional_fields: &["Suggested Category", "Reason", "Notes"],
        defaults: &[("Status", "Unsorted")],
    },
];

/// Agent-facing extra field names and the Notion properties they fill.
pub const EXTRA_FIELD_MAP: &[(&str, &str)] = &[
    ("location", "Location"),
    ("cost_estimate", "Cost Estimate"),
    ("project", "Project"),
    ("repo", "Repo"),
    ("class_name", "Class"),
    ("topic", "Topic"),
    ("platform", "Platform"),
    ("company", "Company"),
    ("contact", "Contact"),
    ("area", "Area"),
    ("workflow", "Workflow"),
    ("type", "Type"),
    ("event_or_group", "Event / Group"),
    ("suggested_category", "Suggested Category"),
    ("reason", "Reason"),
];

/// Every topic schema, in category order.
#[must_use]
pub fn topic_schemas() -> &'static [TopicSchema] {
    &TOPIC_SCHEMAS
}

/// Schema for a category.
#[must_use]
pub fn topic_schema(category: Category) -> &'static TopicSchema {
    match category {
        Category::ShoppingErrands => &TOPIC_SCHEMAS[0],
        Category::TechnicalDev => &TOPIC_SCHEMAS[1],
        Category::ClassStudy => &TOPIC_SCHEMAS[2],
        Category::ContentWriting => &TOPIC_SCHEMAS[3],
        Category::BusinessSales => &TOPIC_SCHEMAS[4],
        Category::Personal => &TOPIC_SCHEMAS[5],
        Category::WorkflowProcess => &TOPIC_SCHEMAS[6],
        Category::SocialCommunity => &TOPIC_SCHEMAS[7],
        Category::NeedsSorting => &TOPIC_SCHEMAS[8],
    }
}

/// Notion property for an agent-facing extra field name.
#[must_use]
pub fn property_for_extra_field(key: &str) -> Option<&'static str> {
    EXTRA_FIELD_MAP
        .iter()
        .find(|(external, _)| *external == key)
        .map(|(_, property)| *property)
}

/// Agent-facing extra field name for a Notion property.
#[must_use]
pub fn extra_field_for_property(property: &str) -> Option<&'static str> {
    EXTRA_FIELD_MAP
        .iter()
        .find(|(_, prop)| *prop == property)
        .map(|(external, _)| *external)
}

impl TopicSchema {
    /// Agent-facing extra field names this database accepts.
    #[must_use]
    pub fn extra_fields(&self) -> Vec<&'static str> {
        self.optional_fields
            .iter()
            .filter_map(|property| extra_field_for_property(property))
            .collect()
    }

    /// Required fields with no non-null value in `fields`.
    ///
    /// Advisory only: nothing in the write path rejects an entry because of
    /// this, Notion performs its own validation.
    #[must_use]
    pub fn missing_required(&self, fields: &Fields) -> Vec<&'static str> {
        self.required_fields
            .iter()
            .copied()
            .filter(|name| fields.get(*name).map_or(true, |value| value.is_null()))
            .collect()
    }
}
