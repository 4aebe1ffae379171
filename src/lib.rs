//! # Claude Code runtime for Rust
//!
//! Drives a long-lived Claude Code CLI process over newline-delimited JSON on
//! stdin/stdout. One duplex stream carries the conversation output, control
//! requests the CLI sends to this process (permission checks, hook
//! callbacks, in-process MCP tool calls), and control requests this process
//! sends to the CLI (initialize, interrupt, permission mode and model changes).
//!
//! ## Quick Start
//!
//! ```no_run
//! use kodegen_claude_runtime::query;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = query("What is 2 + 2?", None).await?;
//!     let mut stream = Box::pin(stream);
//!
//!     while let Some(message) = stream.next().await {
//!         if let kodegen_claude_runtime::Message::Assistant { message, .. } = message? {
//!             log::info!("Claude: {:?}", message);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive sessions
//!
//! ```no_run
//! # use kodegen_claude_runtime::{ClaudeSDKClient, ClaudeAgentOptions};
//! # use futures::StreamExt;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClaudeAgentOptions::builder().max_turns(10).build();
//! let mut client = ClaudeSDKClient::new(options, None).await?;
//!
//! client.send_message("Hello, Claude!").await?;
//! {
//!     let response = client.receive_response();
//!     futures::pin_mut!(response);
//!     while let Some(message) = response.next().await {
//!         log::info!("{:?}", message?);
//!     }
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom tools
//!
//! ```no_run
//! # use kodegen_claude_runtime::mcp::{SdkMcpServer, SdkMcpTool, ToolResult};
//! # use kodegen_claude_runtime::{ClaudeAgentOptions, McpServerConfig};
//! # use serde_json::json;
//! let calculator = SdkMcpServer::new("calculator").tool(SdkMcpTool::new(
//!     "add",
//!     "Add two numbers",
//!     json!({"type": "object", "properties": {
//!         "a": {"type": "number"},
//!         "b": {"type": "number"}
//!     }, "required": ["a", "b"]}),
//!     |input| async move {
//!         let sum = input["a"].as_f64().unwrap_or(0.0) + input["b"].as_f64().unwrap_or(0.0);
//!         Ok(ToolResult::text(format!("Sum: {sum}")))
//!     },
//! ));
//!
//! let options = ClaudeAgentOptions::builder()
//!     .add_mcp_server("calculator", McpServerConfig::Sdk(calculator))
//!     .add_allowed_tool("mcp__calculator__add")
//!     .build();
//! ```
//!
//! See the [`mcp`] module for more details.
//!
//! ## Hooks
//!
//! ```no_run
//! # use kodegen_claude_runtime::{ClaudeAgentOptions, HookManager, HookEvent, HookOutput};
//! # use kodegen_claude_runtime::hooks::HookMatcherBuilder;
//! let hook = HookManager::callback(|input, _tool_use_id, context| async move {
//!     log::info!("{:?} wants to run {}", context.tool_name, input["tool_input"]);
//!     Ok(HookOutput::default())
//! });
//!
//! let options = ClaudeAgentOptions::builder()
//!     .add_hook(
//!         HookEvent::PreToolUse,
//!         HookMatcherBuilder::new(Some("*")).add_hook(hook).build(),
//!     )
//!     .build();
//! ```
//!
//! See the [`hooks`] module for more details.
//!
//! ## Permission Control
//!
//! ```no_run
//! # use kodegen_claude_runtime::{ClaudeAgentOptions, PermissionManager, PermissionResult};
//! let permission_callback = PermissionManager::callback(
//!     |tool_name, _tool_input, _context| async move {
//!         match tool_name.as_str() {
//!             "Read" | "Glob" => Ok(PermissionResult::allow()),
//!             _ => Ok(PermissionResult::deny("Tool not allowed")),
//!         }
//!     }
//! );
//!
//! let options = ClaudeAgentOptions::builder()
//!     .can_use_tool(permission_callback)
//!     .build();
//! ```
//!
//! ## Architecture
//!
//! - [`transport`]: line framing, subprocess and stream transports
//! - [`message`]: frame classification and message decoding
//! - [`control`]: control protocol messages and request correlation
//! - [`hooks`]: hook registration and dispatch
//! - [`mcp`]: in-process MCP servers and the tool bridge
//! - [`permissions`]: `can_use_tool` handling
//! - [`client`]: the session state machine
//! - [`query()`]: one-shot helper
//! - [`types`]: shared types and configuration
//! - [`error`]: error taxonomy
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, ClaudeError>`](Result).
//! [`ClaudeError::is_session_fatal`] tells whether an error ended the session.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod control;
pub mod error;
pub mod hooks;
pub mod mcp;
pub mod message;
pub mod permissions;
pub mod query;
pub mod transport;
pub mod types;

pub use client::{ClaudeSDKClient, SessionState};
pub use control::{ClientCapabilities, ControlChannel, ControlRequest, ControlResponse};
pub use error::{ClaudeError, Result};
pub use hooks::{HookManager, HookMatcherBuilder};
pub use mcp::{SdkMcpServer, SdkMcpTool, ToolBridge, ToolResult};
pub use message::{InboundFrame, classify_frame, parse_message};
pub use permissions::{PermissionManager, PermissionManagerBuilder};
pub use query::{query, query_with_transport};
pub use transport::{
    JsonLinesCodec, StreamTransport, SubprocessTransport, Transport, encode_line,
};

pub use types::agent::{AgentDefinition, SystemPrompt, SystemPromptPreset};
pub use types::hooks::{
    HookCallback, HookContext, HookDecision, HookEvent, HookHandler, HookMatcher, HookOutput,
};
pub use types::identifiers::{RequestId, SessionId, ToolName};
pub use types::mcp::{McpRemoteServerConfig, McpServerConfig, McpServers, McpStdioServerConfig};
pub use types::messages::{
    AssistantMessageContent, ContentBlock, ContentValue, Message, TextBlock, ThinkingBlock,
    ToolResultBlock, ToolUseBlock, UserContent, UserMessageContent,
};
pub use types::options::{
    ClaudeAgentOptions, ClaudeAgentOptionsBuilder, DEFAULT_CONTROL_TIMEOUT,
    DEFAULT_INITIALIZE_TIMEOUT, MAX_ALLOWED_TURNS, StderrCallback,
};
pub use types::permissions::{
    CanUseToolCallback, PermissionBehavior, PermissionMode, PermissionResult,
    PermissionResultAllow, PermissionResultDeny, PermissionRuleValue, PermissionUpdate,
    PermissionUpdateDestination, SettingSource, ToolPermissionContext,
};

/// Version of this crate, reported to the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
