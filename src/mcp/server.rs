//! In-process MCP server hosting SDK tools

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
use super::tool::{SdkMcpTool, ToolResult};
use crate::error::{ClaudeError, Result};

/// An in-process MCP server that hosts custom tools
///
/// # Example
///
/// ```rust
/// use kodegen_claude_runtime::mcp::{SdkMcpServer, SdkMcpTool, ToolResult};
/// use serde_json::json;
///
/// let server = SdkMcpServer::new("calc")
///     .version("1.0.0")
///     .tool(SdkMcpTool::new(
///         "add",
///         "Add two numbers",
///         json!({"type": "object", "properties": {"a": {"type": "number"}, "b": {"type": "number"}}}),
///         |input| async move {
///             let sum = input["a"].as_f64().unwrap_or(0.0) + input["b"].as_f64().unwrap_or(0.0);
///             Ok(ToolResult::text(format!("Sum: {sum}")))
///         },
///     ));
/// assert!(server.get_tool("add").is_some());
/// ```
#[derive(Clone)]
pub struct SdkMcpServer {
    name: String,
    version: String,
    /// Tools in registration order
    tools: Vec<SdkMcpTool>,
}

impl SdkMcpServer {
    /// Create a new MCP server with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            tools: Vec::new(),
        }
    }

    /// Set the server version
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Register a tool with the server
    ///
    /// Names must be unique within a server; duplicates are reported by
    /// [`SdkMcpServer::validate`] when the server is registered with a bridge.
    #[must_use]
    pub fn tool(mut self, tool: SdkMcpTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Register several tools
    #[must_use]
    pub fn tools(mut self, tools: impl IntoIterator<Item = SdkMcpTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Get the server name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the server version
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.version
    }

    /// Get a tool by name
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&SdkMcpTool> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    /// Get all registered tools
    #[must_use]
    pub fn list_tools(&self) -> &[SdkMcpTool] {
        &self.tools
    }

    /// Check the server configuration
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` if the name is empty or a tool name repeats
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ClaudeError::invalid_config("SDK MCP server name is empty"));
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name()) {
                return Err(ClaudeError::invalid_config(format!(
                    "Duplicate tool '{}' in SDK MCP server '{}'",
                    tool.name(),
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Call a tool by name
    ///
    /// Arguments failing schema validation, handler errors and handler panics
    /// all become error results; the handler is not run for invalid arguments.
    ///
    /// # Errors
    /// Returns `ClaudeError::ToolNotFound` if no tool has this name
    pub async fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolResult> {
        let tool = self.get_tool(name).ok_or_else(|| {
            ClaudeError::tool_not_found(format!("{name} (server '{}')", self.name))
        })?;

        if let Err(violation) = check_arguments(tool.input_schema(), &arguments) {
            log::debug!("Rejected arguments for {}/{name}: {violation}", self.name);
            return Ok(ToolResult::error(format!(
                "Invalid arguments for tool '{name}': {violation}"
            )));
        }

        match AssertUnwindSafe(tool.invoke(arguments)).catch_unwind().await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                log::warn!("Tool {}/{name} failed: {e}", self.name);
                Ok(ToolResult::error(format!("Tool '{name}' failed: {e}")))
            }
            Err(_) => {
                log::warn!("Tool {}/{name} panicked", self.name);
                Ok(ToolResult::error(format!("Tool '{name}' panicked")))
            }
        }
    }

    /// Handle an MCP JSON-RPC request
    ///
    /// Supports `initialize`, `notifications/initialized`, `tools/list` and
    /// `tools/call`; other methods get a method-not-found error object.
    ///
    /// # Errors
    /// Returns `ClaudeError::ToolNotFound` when `tools/call` names an unknown
    /// tool, and `ClaudeError::Mcp` if a result cannot be serialized
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let request_id = request.id.clone().unwrap_or(serde_json::Value::Null);

        match request.method.as_str() {
            "initialize" => Ok(JsonRpcResponse::success(
                request_id,
                serde_json::json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": self.name, "version": self.version},
                }),
            )),
            "notifications/initialized" => {
                Ok(JsonRpcResponse::success(request_id, serde_json::json!({})))
            }
            "tools/list" => {
                let tools: Vec<_> = self.tools.iter().map(SdkMcpTool::to_tool_info).collect();
                Ok(JsonRpcResponse::success(
                    request_id,
                    serde_json::json!({ "tools": tools }),
                ))
            }
            "tools/call" => {
                let params = request.params.unwrap_or(serde_json::Value::Null);
                let Some(tool_name) = params.get("name").and_then(serde_json::Value::as_str)
                else {
                    return Ok(JsonRpcResponse::error(
                        request_id,
                        JsonRpcError::invalid_params("tools/call requires a tool name"),
                    ));
                };
                let arguments = params
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({}));

                let result = self.call_tool(tool_name, arguments).await?;
                let result = serde_json::to_value(result)
                    .map_err(|e| ClaudeError::mcp(format!("Failed to serialize result: {e}")))?;
                Ok(JsonRpcResponse::success(request_id, result))
            }
            other => Ok(JsonRpcResponse::error(
                request_id,
                JsonRpcError::method_not_found(other),
            )),
        }
    }
}

/// Validate tool arguments against the tool's input schema
///
/// Reports the first violation as `$.path: message`.
fn check_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> std::result::Result<(), String> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| format!("tool input schema is invalid: {e}"))?;

    match validator.iter_errors(arguments).next() {
        None => Ok(()),
        Some(error) => Err(format!(
            "{}: {error}",
            json_path(&error.instance_path.to_string())
        )),
    }
}

/// Render a JSON pointer such as `/tags/1` as `$.tags[1]`
fn json_path(pointer: &str) -> String {
    let mut path = String::from("$");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push_str(&format!("[{segment}]"));
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}

impl std::fmt::Debug for SdkMcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkMcpServer")
            .field("name", &self.name)
            .field("version", &self.version)
            .field(
                "tools",
                &self.tools.iter().map(SdkMcpTool::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
