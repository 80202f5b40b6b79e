//! Orchestration instruction for the capture agent.
//!
//! The instruction is a Handlebars template rendered with the category
//! registry, so adding a category or a topic field only touches
//! [`crate::registry`].

use anyhow::Result;
use handlebars::Handlebars;
use serde::Serialize;

use crate::registry::{
    topic_schema, Category, CLASSIFICATION_RULES, CONFIDENCE_THRESHOLD,
};

/// One-line description of the agent.
pub const AGENT_DESCRIPTION: &str = "Captures tasks and to-dos, classifies them by topic \
     (Shopping, Technical, Study, Content, Business, Personal, Workflow, Social), \
     and routes them to the correct Notion database.";

const TEMPLATE_NAME: &str = "instruction";

/// Category table row.
#[derive(Debug, Serialize)]
struct CategoryRow {
    name: &'static str,
    description: &'static str,
    examples: String,
}

/// Extra fields a category's database accepts.
#[derive(Debug, Serialize)]
struct RouteRow {
    name: &'static str,
    fields: String,
}

#[derive(Debug, Serialize)]
struct InstructionData {
    categories: Vec<CategoryRow>,
    routes: Vec<RouteRow>,
    rules: &'static str,
    threshold: f64,
    catch_all: &'static str,
    catch_all_fields: String,
}

impl InstructionData {
    fn from_registry() -> Self {
        let categories = Category::topical()
            .iter()
            .map(|category| CategoryRow {
                name: category.as_str(),
                description: category.description(),
                examples: category
                    .examples()
                    .iter()
                    .map(|e| format!("\"{e}\""))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
            .collect();

        let routes = Category::topical()
            .iter()
            .map(|category| RouteRow {
                name: category.as_str(),
                fields: topic_schema(*category).extra_fields().join(", "),
            })
            .filter(|row| !row.fields.is_empty())
            .collect();

        Self {
            categories,
            routes,
            rules: CLASSIFICATION_RULES,
            threshold: CONFIDENCE_THRESHOLD,
            catch_all: Category::NeedsSorting.as_str(),
            catch_all_fields: topic_schema(Category::NeedsSorting)
                .extra_fields()
                .join(" and "),
        }
    }
}

/// Renders the agent instruction.
pub struct InstructionRenderer {
    handlebars: Handlebars<'static>,
}

impl InstructionRenderer {
    /// Create a renderer with the built-in template.
    pub fn new() -> Result<Self> {
        Self::from_template(INSTRUCTION_TEMPLATE)
    }

    /// Create a renderer with a custom template.
    ///
    /// The template sees `categories`, `routes`, `rules`, `threshold`,
    /// `catch_all` and `catch_all_fields`.
    pub fn from_template(template: &str) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(TEMPLATE_NAME, template)?;
        Ok(Self { handlebars })
    }

    /// Render the instruction from the registry.
    pub fn render(&self) -> Result<String> {
        let rendered = self
            .handlebars
            .render(TEMPLATE_NAME, &InstructionData::from_registry())?;
        Ok(rendered)
    }
}

/// Render the built-in instruction.
pub fn instruction() -> Result<String> {
    InstructionRenderer::new()?.render()
}

const INSTRUCTION_TEMPLATE: &str = r#"You are a task capture assistant. Your job is to receive a task or to-do from the user, classify it by topic, route it to the correct Notion database, and confirm.

Be conversational and low-friction. The user wants to capture a thought before it disappears, so don't slow them down with unnecessary questions.

## Workflow

Follow these steps in exact order for every task:

### Step 1: Capture
Receive the user's task. If it's clear, proceed immediately. Do NOT ask follow-up questions unless the input is genuinely ambiguous.
Optionally note if the user mentions priority (High / Medium / Low) or extra context.

### Step 2: Create Master Record
Call the `create_master_record` tool with the raw task text and priority.
This creates an audit trail entry before classification, so no task is lost.
Save the returned page_id for Step 5.

### Step 3: Classify
Evaluate the raw input against these categories. Choose the single best fit.

| Category | What belongs here | Examples |
|----------|------------------|----------|
{{#each categories}}
| **{{name}}** | {{description}} | {{examples}} |
{{/each}}

**Classification rules:**
{{rules}}

Assign a confidence level:
- **High** (>= {{threshold}}): the task clearly belongs to one category
- **Medium**: reasonable fit but could go either way
- **Low** (< {{threshold}}): genuinely ambiguous. Ask the user OR route to {{catch_all}}

### Step 4: Route
Call the `create_topic_entry` tool with the classified category, task title, priority, and any domain-specific fields you can extract from the input:
{{#each routes}}
- {{name}}: {{fields}}
{{/each}}

For "{{catch_all}}": include {{catch_all_fields}} (your best guess and why you're unsure).

### Step 5: Link
Call the `update_master_record` tool to update the master record:
- Set status to "Routed" (or "{{catch_all}}" for ambiguous tasks)
- Set the category
- Set topic_link to the URL from Step 4
- Set confidence to "High", "Medium", or "Low"

### Step 6: Confirm
Respond briefly. The user is working, not doing admin.

**Routed successfully:**
> Logged to [Category]: "[task summary]"

**User was asked to clarify:**
> Logged to [Category] (you confirmed): "[task summary]"

**{{catch_all}}:**
> Captured "[task summary]" but couldn't classify confidently. Added to {{catch_all}}.

**Partial failure (Notion error):**
If any Notion call fails, call the `log_fallback` tool to ensure the task isn't lost, then tell the user:
> Captured "[task summary]" to the fallback log. Notion had an issue. Nothing is lost.

Keep confirmations to one or two sentences. Always include the category name.

## Multiple Tasks
If the user provides multiple tasks in one message, process each one through the full pipeline (Steps 1-6) sequentially. Confirm all at the end in a summary.

## Reviewing Tasks
If the user asks to see their tasks or check what's been captured, let them know this agent is for capture only. They can check their Notion databases directly.
"#;
