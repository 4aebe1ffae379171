//! Routing of CLI tool traffic to in-process MCP servers

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::protocol::JsonRpcRequest;
use super::server::SdkMcpServer;
use super::tool::ToolResult;
use crate::error::{ClaudeError, Result};
use crate::types::mcp::{McpServerConfig, McpServers};

/// Prefix of qualified SDK tool names
const QUALIFIED_PREFIX: &str = "mcp__";
/// Separator between server and tool in a qualified name
const QUALIFIED_SEPARATOR: &str = "__";

/// Registry of in-process servers, keyed by server name
///
/// Tools are addressed from the CLI as `mcp__<server>__<tool>`.
#[derive(Default)]
pub struct ToolBridge {
    servers: Mutex<HashMap<String, Arc<SdkMcpServer>>>,
}

impl ToolBridge {
    /// Create an empty bridge
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bridge holding every SDK server in `servers`
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` if a server is invalid or registered twice
    pub fn from_servers(servers: &McpServers) -> Result<Self> {
        let bridge = Self::new();
        if let McpServers::Dict(configs) = servers {
            for config in configs.values() {
                if let McpServerConfig::Sdk(server) = config {
                    bridge.register_server(server.clone())?;
                }
            }
        }
        Ok(bridge)
    }

    /// Register a server under its own name
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` if the server has duplicate tools
    /// or a server with the same name is already registered
    pub fn register_server(&self, server: SdkMcpServer) -> Result<()> {
        server.validate()?;

        let mut servers = self.servers.lock();
        if servers.contains_key(server.name()) {
            return Err(ClaudeError::invalid_config(format!(
                "SDK MCP server '{}' is already registered",
                server.name()
            )));
        }
        log::debug!(
            "Registered SDK MCP server '{}' with {} tool(s)",
            server.name(),
            server.list_tools().len()
        );
        servers.insert(server.name().to_string(), Arc::new(server));
        Ok(())
    }

    /// Whether no servers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.servers.lock().is_empty()
    }

    /// Names of the registered servers, sorted
    #[must_use]
    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.servers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn server(&self, name: &str) -> Option<Arc<SdkMcpServer>> {
        self.servers.lock().get(name).cloned()
    }

    /// Build the qualified name of a tool
    #[must_use]
    pub fn qualified_name(server: &str, tool: &str) -> String {
        format!("{QUALIFIED_PREFIX}{server}{QUALIFIED_SEPARATOR}{tool}")
    }

    /// Split a qualified name into server and tool
    ///
    /// The server name ends at the first separator; the tool name may itself
    /// contain `__`.
    #[must_use]
    pub fn parse_qualified_name(qualified: &str) -> Option<(&str, &str)> {
        let rest = qualified.strip_prefix(QUALIFIED_PREFIX)?;
        let (server, tool) = rest.split_once(QUALIFIED_SEPARATOR)?;
        if server.is_empty() || tool.is_empty() {
            return None;
        }
        Some((server, tool))
    }

    /// Invoke a tool by qualified name
    ///
    /// # Errors
    /// Returns `ClaudeError::ToolNotFound` if the name is malformed, names an
    /// unknown server, or names an unknown tool
    pub async fn invoke(&self, qualified: &str, arguments: serde_json::Value) -> Result<ToolResult> {
        let (server_name, tool_name) = Self::parse_qualified_name(qualified)
            .ok_or_else(|| ClaudeError::tool_not_found(qualified))?;
        let server = self
            .server(server_name)
            .ok_or_else(|| ClaudeError::tool_not_found(qualified))?;

        server.call_tool(tool_name, arguments).await
    }

    /// Handle an `mcp_message` control request
    ///
    /// Returns the control response payload `{"mcp_response": <jsonrpc>}`.
    ///
    /// # Errors
    /// Returns `ClaudeError::ToolNotFound` for an unknown server or tool and
    /// `ClaudeError::Mcp` if `message` is not a JSON-RPC request
    pub async fn handle_mcp_message(
        &self,
        server_name: &str,
        message: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let server = self.server(server_name).ok_or_else(|| {
            ClaudeError::tool_not_found(format!("SDK MCP server '{server_name}'"))
        })?;

        let request: JsonRpcRequest = serde_json::from_value(message)
            .map_err(|e| ClaudeError::mcp(format!("Invalid JSON-RPC message: {e}")))?;
        log::trace!("MCP {} -> {server_name}", request.method);

        let response = server.handle_request(request).await?;
        let response = serde_json::to_value(response)
            .map_err(|e| ClaudeError::mcp(format!("Failed to serialize response: {e}")))?;

        Ok(serde_json::json!({ "mcp_response": response }))
    }
}

impl std::fmt::Debug for ToolBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBridge")
            .field("servers", &self.server_names())
            .finish()
    }
}
