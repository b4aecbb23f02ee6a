//! MCP server over stdio.
//!
//! Reads one JSON-RPC 2.0 message per line and writes one response per line.
//! A server holds a single [`ToolRegistry`], and therefore a single
//! [`ExplorerSession`]: one stdio connection is one agent session.

use super::dispatch::McpMethod;
use super::tools::ToolRegistry;
use crate::session::ExplorerSession;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::time::Instant;
use tracing::info_span;

/// Maximum request size (1 MiB).
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported in `initialize`.
const SERVER_NAME: &str = "schemadex";

/// MCP server for schema exploration.
pub struct McpServer {
    /// Tool registry, owning the session.
    tools: ToolRegistry,
}

impl McpServer {
    /// Creates a server for one caller's session.
    #[must_use]
    pub fn new(session: ExplorerSession) -> Self {
        Self {
            tools: ToolRegistry::new(session),
        }
    }

    /// The tool registry.
    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Serves requests from stdin until it closes.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read or stdout cannot be written.
    pub fn start(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve(BufReader::new(stdin.lock()), stdout.lock())
    }

    /// Serves newline-delimited requests from `reader`, answering on `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<()> {
        for line in reader.lines() {
            let line = line.map_err(|e| Error::operation("read_stdin", e))?;

            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_request(&line) else {
                continue;
            };

            writeln!(writer, "{response}").map_err(|e| Error::operation("write_stdout", e))?;
            writer
                .flush()
                .map_err(|e| Error::operation("flush_stdout", e))?;
        }

        tracing::info!("MCP input closed, shutting down");
        Ok(())
    }

    /// Handles one JSON-RPC message.
    ///
    /// Returns `None` for notifications (messages without an `id` member).
    /// An explicit `"id": null` is a request and is answered with a null id.
    pub fn handle_request(&mut self, request: &str) -> Option<String> {
        if request.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = request.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request exceeds maximum size limit"
            );
            return Some(format_error(
                Value::Null,
                -32600,
                &format!(
                    "Request too large: {} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)",
                    request.len()
                ),
            ));
        }

        let start = Instant::now();
        let span = info_span!(
            "mcp.request",
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let mut method_label = "parse_error".to_string();
        let mut status_label = "error";

        let response = match parse_request(request) {
            Ok(req) => {
                method_label.clone_from(&req.method);
                span.record("rpc.method", method_label.as_str());

                match req.id {
                    Some(id) => {
                        span.record("rpc.id", id.to_string().as_str());
                        tracing::debug!(method = %method_label, "Processing MCP request");

                        let result = self.dispatch_method(&req.method, req.params);
                        status_label = if result.is_ok() { "success" } else { "error" };
                        Some(format_response(id, result))
                    },
                    None => {
                        if McpMethod::from(req.method.as_str()).is_notification() {
                            tracing::debug!(method = %method_label, "Ignoring notification");
                        } else {
                            tracing::warn!(method = %method_label, "Dropping request without id");
                        }
                        status_label = "notification";
                        None
                    },
                }
            },
            Err(RequestError::Parse(e)) => {
                Some(format_error(Value::Null, -32700, &format!("Parse error: {e}")))
            },
            Err(RequestError::Invalid { id, reason }) => {
                method_label = "invalid_request".to_string();
                tracing::debug!(reason = %reason, "Rejecting invalid request");
                Some(format_error(id, -32600, &format!("Invalid Request: {reason}")))
            },
        };
        span.record("status", status_label);

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label,
            "status" => status_label
        )
        .increment(1);
        tracing::trace!(elapsed = ?start.elapsed(), "Handled MCP message");

        response
    }

    fn dispatch_method(&mut self, method: &str, params: Option<Value>) -> DispatchResult {
        match McpMethod::from(method) {
            McpMethod::Initialize => Ok(Self::handle_initialize()),
            McpMethod::ListTools => Ok(self.handle_list_tools()),
            McpMethod::CallTool => self.handle_call_tool(params),
            McpMethod::Ping => Ok(serde_json::json!({})),
            McpMethod::Unknown(name) => Err((-32601, format!("Method not found: {name}"))),
        }
    }

    fn handle_initialize() -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn handle_list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .list_tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        serde_json::json!({ "tools": tools })
    }

    fn handle_call_tool(&mut self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((-32602, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((-32602, "Missing tool name".to_string()))?
            .to_string();
        let span = info_span!("mcp.tool.call", tool.name = name.as_str());
        let _guard = span.enter();

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let (content, is_error) = match self.tools.execute(&name, arguments) {
            Ok(result) => (serde_json::to_value(&result.content), result.is_error),
            Err(e) => {
                tracing::debug!(tool = %name, error = %e, "Tool call rejected");
                (
                    Ok(serde_json::json!([{ "type": "text", "text": e.to_string() }])),
                    true,
                )
            },
        };
        let content = content.map_err(|e| (-32603, e.to_string()))?;

        Ok(serde_json::json!({
            "content": content,
            "isError": is_error
        }))
    }
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

fn format_response(id: Value, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

fn format_error(id: Value, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Why a message could not be dispatched.
enum RequestError {
    /// Not JSON at all (-32700).
    Parse(serde_json::Error),
    /// JSON, but not a JSON-RPC 2.0 request (-32600).
    Invalid { id: Value, reason: String },
}

/// Parses a message in two steps so that malformed JSON and well-formed
/// JSON with the wrong shape get different error codes.
fn parse_request(request: &str) -> std::result::Result<JsonRpcRequest, RequestError> {
    let value: Value = serde_json::from_str(request).map_err(RequestError::Parse)?;
    let id = value.get("id").cloned().unwrap_or(Value::Null);

    let req: JsonRpcRequest = serde_json::from_value(value).map_err(|e| RequestError::Invalid {
        id: id.clone(),
        reason: e.to_string(),
    })?;
    if req.jsonrpc != "2.0" {
        return Err(RequestError::Invalid {
            id,
            reason: format!("unsupported jsonrpc version {:?}", req.jsonrpc),
        });
    }
    Ok(req)
}

/// Maps a present `id` member to `Some`, including `null`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    /// `None` when the member is absent, which marks a notification.
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}
