//! Control protocol message types
//!
//! This module defines the control request and response payloads exchanged
//! with the CLI, in both directions, and the frames that carry them.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::identifiers::{RequestId, ToolName};
use crate::types::permissions::PermissionMode;

/// Body of a control request, discriminated by `subtype`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ControlRequest {
    /// CLI asks whether a tool may run
    CanUseTool {
        /// Tool being requested
        tool_name: ToolName,
        /// Tool input parameters
        input: serde_json::Value,
        /// Permission updates the CLI suggests, kept raw so unknown kinds do not fail the request
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission_suggestions: Option<Vec<serde_json::Value>>,
        /// Path that triggered the prompt
        #[serde(default, skip_serializing_if = "Option::is_none")]
        blocked_path: Option<String>,
    },
    /// CLI invokes a registered hook
    HookCallback {
        /// Callback id advertised during initialize
        #[serde(default, skip_serializing_if = "Option::is_none")]
        callback_id: Option<String>,
        /// Hook input (`hook_event_name`, `tool_name`, `tool_input`, ...)
        input: serde_json::Value,
        /// Tool use the hook concerns
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<String>,
    },
    /// CLI forwards a JSON-RPC message to an in-process MCP server
    McpMessage {
        /// Target server name
        server_name: String,
        /// JSON-RPC message
        message: serde_json::Value,
    },
    /// Interrupt the current turn
    Interrupt,
    /// Change the permission mode
    SetPermissionMode {
        /// New mode
        mode: PermissionMode,
    },
    /// Change the model (`None` restores the default)
    SetModel {
        /// New model name
        #[serde(default)]
        model: Option<String>,
    },
    /// Session handshake
    Initialize {
        /// Hook configuration, keyed by event name
        #[serde(default)]
        hooks: Option<serde_json::Value>,
    },
}

impl ControlRequest {
    /// Wire name of the request subtype
    #[must_use]
    pub const fn subtype(&self) -> &'static str {
        match self {
            Self::CanUseTool { .. } => "can_use_tool",
            Self::HookCallback { .. } => "hook_callback",
            Self::McpMessage { .. } => "mcp_message",
            Self::Interrupt => "interrupt",
            Self::SetPermissionMode { .. } => "set_permission_mode",
            Self::SetModel { .. } => "set_model",
            Self::Initialize { .. } => "initialize",
        }
    }

    /// Build the `control_request` frame carrying this request
    ///
    /// # Errors
    /// Returns error if the request cannot be serialized
    pub fn to_frame(&self, request_id: &RequestId) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "type": "control_request",
            "request_id": request_id,
            "request": serde_json::to_value(self)?,
        }))
    }
}

/// Reply to a control request, discriminated by `subtype`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ControlResponse {
    /// Request succeeded
    Success {
        /// Request ID this responds to
        request_id: RequestId,
        /// Optional response data
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<serde_json::Value>,
    },
    /// Request failed
    Error {
        /// Request ID this responds to
        request_id: RequestId,
        /// Error message
        error: String,
    },
}

impl ControlResponse {
    /// Build a response from a handler outcome
    #[must_use]
    pub fn from_result(request_id: RequestId, outcome: Result<serde_json::Value>) -> Self {
        match outcome {
            Ok(response) => Self::Success {
                request_id,
                response: Some(response),
            },
            Err(e) => Self::Error {
                request_id,
                error: e.to_string(),
            },
        }
    }

    /// Request ID this responds to
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        match self {
            Self::Success { request_id, .. } | Self::Error { request_id, .. } => request_id,
        }
    }

    /// Build the `control_response` frame carrying this response
    ///
    /// # Errors
    /// Returns error if the response cannot be serialized
    pub fn to_frame(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "type": "control_response",
            "response": serde_json::to_value(self)?,
        }))
    }
}
