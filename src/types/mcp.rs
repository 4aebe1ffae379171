//! MCP (Model Context Protocol) server configuration types
//!
//! External servers (stdio, HTTP, SSE) are handed to the CLI via
//! `--mcp-config`. SDK servers run in-process; the CLI only learns their name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::mcp::SdkMcpServer;

/// MCP stdio server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpStdioServerConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

/// Remote (HTTP or SSE) MCP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpRemoteServerConfig {
    /// Server URL
    pub url: String,
    /// HTTP headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// MCP server configuration
#[derive(Debug, Clone)]
pub enum McpServerConfig {
    /// Stdio-based MCP server
    Stdio(McpStdioServerConfig),
    /// HTTP-based MCP server
    Http(McpRemoteServerConfig),
    /// SSE-based MCP server
    Sse(McpRemoteServerConfig),
    /// In-process server served through the tool bridge
    Sdk(SdkMcpServer),
}

impl McpServerConfig {
    /// Configuration as passed to the CLI in `--mcp-config`
    ///
    /// SDK servers become `{"type": "sdk", "name": ...}`; their tools stay local.
    #[must_use]
    pub fn to_cli_config(&self) -> serde_json::Value {
        match self {
            Self::Stdio(config) => tagged("stdio", config),
            Self::Http(config) => tagged("http", config),
            Self::Sse(config) => tagged("sse", config),
            Self::Sdk(server) => serde_json::json!({"type": "sdk", "name": server.name()}),
        }
    }
}

fn tagged(kind: &str, config: &impl Serialize) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(object) = value.as_object_mut() {
        object.insert("type".to_string(), serde_json::Value::from(kind));
    }
    value
}

/// MCP servers container
#[derive(Debug, Clone, Default)]
pub enum McpServers {
    /// No MCP servers
    #[default]
    None,
    /// Servers keyed by name
    Dict(HashMap<String, McpServerConfig>),
    /// Path to an MCP servers configuration file
    Path(PathBuf),
}

impl McpServers {
    /// Add a server, converting from `None` if needed
    #[must_use]
    pub fn with(self, name: impl Into<String>, config: McpServerConfig) -> Self {
        let mut servers = match self {
            Self::Dict(servers) => servers,
            Self::None | Self::Path(_) => HashMap::new(),
        };
        servers.insert(name.into(), config);
        Self::Dict(servers)
    }

    /// Whether any in-process server is configured
    #[must_use]
    pub fn has_sdk_servers(&self) -> bool {
        matches!(self, Self::Dict(servers) if servers.values().any(|c| matches!(c, McpServerConfig::Sdk(_))))
    }

    /// The `--mcp-config` argument value, if any
    #[must_use]
    pub fn to_cli_arg(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Path(path) => Some(path.to_string_lossy().into_owned()),
            Self::Dict(servers) if servers.is_empty() => None,
            Self::Dict(servers) => {
                let configs: serde_json::Map<String, serde_json::Value> = servers
                    .iter()
                    .map(|(name, config)| (name.clone(), config.to_cli_config()))
                    .collect();
                Some(serde_json::json!({ "mcpServers": configs }).to_string())
            }
        }
    }
}
