//! Capture MCP Server - exposes the task capture tools over stdio.

use anyhow::{Context, Result};
use tracing::info;

use capture::instruction::instruction;
use capture::mcp::McpServer;
use capture::{CaptureConfig, CaptureTools, FallbackLogger, NotionClient, RecordWriter};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CaptureConfig::from_env();
    let notion = NotionClient::from_config(&config).context("Failed to create Notion client")?;
    let fallback = FallbackLogger::new(config.fallback.clone(), &config.source);
    info!(
        spreadsheet = fallback.uses_spreadsheet(),
        "Capture MCP server starting"
    );

    let tools = CaptureTools::new(RecordWriter::new(notion, &config.source), fallback);
    let server = McpServer::new(tools, instruction().context("Failed to render instruction")?);

    server
        .run_stdio()
        .await
        .context("Failed to serve MCP over stdio")
}
