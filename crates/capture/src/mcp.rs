//! Capture MCP server: the agent tool contract over JSON-RPC on stdio.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::instruction::AGENT_DESCRIPTION;
use crate::store::RecordStore;
use crate::tools::{tool_definitions, CaptureTools};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "capture-mcp";
pub const PROMPT_NAME: &str = "task_capture";

const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const PARSE_ERROR: i32 = -32700;

/// JSON-RPC request structure
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response structure
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error structure
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// MCP server state
pub struct McpServer<S> {
    tools: CaptureTools<S>,
    instruction: String,
}

impl<S: RecordStore> McpServer<S> {
    /// `instruction` is served as the `task_capture` prompt.
    pub fn new(tools: CaptureTools<S>, instruction: String) -> Self {
        Self { tools, instruction }
    }

    /// Handle one request. Notifications get no response.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => Self::handle_initialize(id),
            "tools/list" => JsonRpcResponse::result(id, tool_definitions()),
            "tools/call" => self.handle_tool_call(id, request.params.as_ref()).await,
            "prompts/list" => Self::handle_prompts_list(id),
            "prompts/get" => self.handle_prompts_get(id, request.params.as_ref()),
            "ping" => JsonRpcResponse::result(id, json!({})),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, "Method not found"),
        };
        Some(response)
    }

    /// Handle one line of input, returning the serialized response.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(&request).await?,
            Err(e) => JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}")),
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                None
            }
        }
    }

    /// Serve newline-delimited requests until the reader is exhausted.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(line).await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Serve on the process's stdin and stdout.
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve(stdin, tokio::io::stdout()).await
    }

    fn handle_initialize(id: Value) -> JsonRpcResponse {
        JsonRpcResponse::result(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "prompts": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    async fn handle_tool_call(&self, id: Value, params: Option<&Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params");
        };

        let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match self.tools.call(tool_name, &arguments).await {
            Ok(result) => JsonRpcResponse::result(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": result.to_string()
                    }]
                }),
            ),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "Tool call failed");
                JsonRpcResponse::result(
                    id,
                    json!({
                        "content": [{
                            "type": "text",
                            "text": format!("Error: {e}")
                        }],
                        "isError": true
                    }),
                )
            }
        }
    }

    fn handle_prompts_list(id: Value) -> JsonRpcResponse {
        JsonRpcResponse::result(
            id,
            json!({
                "prompts": [{
                    "name": PROMPT_NAME,
                    "description": AGENT_DESCRIPTION
                }]
            }),
        )
    }

    fn handle_prompts_get(&self, id: Value, params: Option<&Value>) -> JsonRpcResponse {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str());
        match name {
            Some(PROMPT_NAME) => JsonRpcResponse::result(
                id,
                json!({
                    "description": AGENT_DESCRIPTION,
                    "messages": [{
                        "role": "user",
                        "content": {
                            "type": "text",
                            "text": self.instruction
                        }
                    }]
                }),
            ),
            Some(other) => {
                JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown prompt: {other}"))
            }
            None => JsonRpcResponse::error(id, INVALID_PARAMS, "Missing prompt name"),
        }
    }
}
