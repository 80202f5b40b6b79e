//! Capture CLI - route tasks into Notion from the shell.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use capture::config::DEFAULT_SOURCE;
use capture::instruction::instruction;
use capture::registry::topic_schema;
use capture::{
    CaptureConfig, CaptureFlow, CaptureOutcome, CaptureRequest, CaptureStep, Category, Confidence,
    FallbackLogger, FieldValue, MasterStatus, NotionClient, Priority, RecordWriter,
    TopicEntryRequest,
};

/// Capture CLI - route tasks into Notion databases.
#[derive(Parser)]
#[command(name = "capture")]
#[command(about = "Capture tasks into topic-specific Notion databases")]
#[command(version)]
struct Cli {
    /// Notion integration token (or set `NOTION_API_KEY` env var).
    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true, default_value = "")]
    notion_api_key: String,

    /// Source tag written on master records (or set `CAPTURE_SOURCE` env var).
    #[arg(long, env = "CAPTURE_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories and the databases they route to.
    Categories,

    /// Print the agent orchestration instruction.
    Instruction,

    /// Master intake record operations.
    Master {
        #[command(subcommand)]
        command: MasterCommands,
    },

    /// Topic database operations.
    Topic {
        #[command(subcommand)]
        command: TopicCommands,
    },

    /// Write a task to the fallback log.
    Fallback {
        /// Task text.
        #[arg(long)]
        title: String,

        /// Category, if known.
        #[arg(long, default_value = "Unknown")]
        category: String,

        /// Priority.
        #[arg(long, default_value = "Medium")]
        priority: String,

        /// Error that triggered the fallback.
        #[arg(long, default_value = "")]
        error: String,
    },

    /// Capture a task end to end: master record, topic entry, link.
    Task {
        #[command(flatten)]
        entry: EntryArgs,

        /// Classification confidence.
        #[arg(long, default_value = "High")]
        confidence: Confidence,
    },
}

#[derive(Subcommand)]
enum MasterCommands {
    /// Create a master record with status Pending.
    Create {
        /// Task text.
        #[arg(long)]
        title: String,

        /// Priority (High, Medium, Low).
        #[arg(long, default_value = "Medium")]
        priority: Priority,
    },

    /// Link a master record to its topic entry.
    Update {
        /// Master record page ID.
        #[arg(long)]
        page_id: String,

        /// Routed or "Needs Sorting".
        #[arg(long)]
        status: MasterStatus,

        /// Category name.
        #[arg(long)]
        category: String,

        /// URL of the topic entry.
        #[arg(long)]
        topic_link: String,

        /// Classification confidence.
        #[arg(long, default_value = "High")]
        confidence: Confidence,
    },
}

#[derive(Subcommand)]
enum TopicCommands {
    /// Create an entry in a category's database.
    Create {
        #[command(flatten)]
        entry: EntryArgs,
    },
}

#[derive(Args)]
struct EntryArgs {
    /// Task text.
    #[arg(long)]
    title: String,

    /// Category name (see `capture categories`).
    #[arg(long)]
    category: String,

    /// Priority (High, Medium, Low).
    #[arg(long, default_value = "Medium")]
    priority: Priority,

    /// Additional context.
    #[arg(long, default_value = "")]
    notes: String,

    /// Domain field as key=value, e.g. `--field location=Target` (repeatable).
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

impl EntryArgs {
    fn extra_fields(&self) -> impl Iterator<Item = (String, FieldValue)> + '_ {
        self.fields.iter().map(|(key, value)| {
            let value = match (key.as_str(), value.parse::<f64>()) {
                ("cost_estimate", Ok(n)) => FieldValue::from(n),
                _ => FieldValue::from(value.as_str()),
            };
            (key.clone(), value)
        })
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in '{s}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = CaptureConfig::from_env();
    if !cli.notion_api_key.trim().is_empty() {
        config.notion_api_key = Some(cli.notion_api_key.trim().to_string());
    }
    config.source = cli.source;

    match cli.command {
        Commands::Categories => print_categories(),

        Commands::Instruction => {
            println!("{}", instruction().context("Failed to render instruction")?);
        }

        Commands::Master { command } => {
            let records = record_writer(&config)?;
            match command {
                MasterCommands::Create { title, priority } => {
                    let master = records.create_master_record(&title, priority).await?;
                    print_json(&master)?;
                }
                MasterCommands::Update {
                    page_id,
                    status,
                    category,
                    topic_link,
                    confidence,
                } => {
                    let update = records
                        .update_master_record(&page_id, status, &category, &topic_link, confidence)
                        .await?;
                    print_json(&update)?;
                }
            }
        }

        Commands::Topic {
            command: TopicCommands::Create { entry },
        } => {
            let records = record_writer(&config)?;
            let mut request = TopicEntryRequest::new(&entry.category, &entry.title)
                .priority(entry.priority)
                .notes(&entry.notes);
            request.extra_fields.extend(entry.extra_fields());

            let created = records.create_topic_entry(&request).await?;
            print_json(&created)?;
        }

        Commands::Fallback {
            title,
            category,
            priority,
            error,
        } => {
            let logger = FallbackLogger::new(config.fallback.clone(), &config.source);
            let outcome = logger
                .log(&title, &category, &priority, &error)
                .await
                .context("Fallback write failed")?;
            print_json(&outcome)?;
        }

        Commands::Task { entry, confidence } => {
            let mut request = CaptureRequest::new(&entry.title, &entry.category)
                .priority(entry.priority)
                .confidence(confidence)
                .notes(&entry.notes);
            request.extra_fields.extend(entry.extra_fields());

            // A missing key is a Notion failure like any other; the task still
            // reaches the fallback log.
            let notion = NotionClient::from_config(&config);
            let fallback = FallbackLogger::new(config.fallback.clone(), &config.source);
            let outcome = match notion {
                Ok(notion) => {
                    CaptureFlow::new(RecordWriter::new(notion, &config.source), fallback)
                        .capture(&request)
                        .await
                }
                Err(e) => {
                    warn!(error = %e, "Notion unavailable, logging to fallback");
                    fallback
                        .log(
                            &request.title,
                            &request.category,
                            request.priority.as_str(),
                            &e.to_string(),
                        )
                        .await
                        .map(|fallback| CaptureOutcome::FellBack {
                            failed_step: CaptureStep::CreateMasterRecord,
                            error: e.to_string(),
                            fallback,
                            master_page_id: None,
                        })
                }
            }
            .context("Task could not be captured or logged")?;

            print_confirmation(&request, &outcome);
            print_json(&outcome)?;
        }
    }

    Ok(())
}

fn record_writer(config: &CaptureConfig) -> Result<RecordWriter<NotionClient>> {
    let notion = NotionClient::from_config(config).context("Failed to create Notion client")?;
    Ok(RecordWriter::new(notion, &config.source))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_categories() {
    println!(
        "\n{:<22} {:<22} {}",
        "CATEGORY".bold(),
        "DATABASE".bold(),
        "FIELDS".bold()
    );
    println!("{}", "-".repeat(80));
    for category in Category::all() {
        let schema = topic_schema(*category);
        let name = if category.is_catch_all() {
            category.as_str().yellow()
        } else {
            category.as_str().cyan()
        };
        println!(
            "{:<22} {:<22} {}",
            name,
            schema.name,
            schema.extra_fields().join(", ")
        );
    }
    println!();
}

fn print_confirmation(request: &CaptureRequest, outcome: &CaptureOutcome) {
    match outcome {
        CaptureOutcome::Routed { entry, .. } => eprintln!(
            "{} Logged to {}: \"{}\"",
            "✅".green(),
            entry.database_name.bold(),
            request.title
        ),
        CaptureOutcome::FellBack { failed_step, .. } => eprintln!(
            "{} Captured \"{}\" to the fallback log ({} failed). Nothing is lost.",
            "⚠️".yellow(),
            request.title,
            failed_step
        ),
    }
}
