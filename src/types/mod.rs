//! Type definitions shared across the runtime
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`, `ToolName`, `RequestId`)
//! - [`permissions`] - Permission modes, rules, and callbacks
//! - [`hooks`] - Hook events, outputs and callbacks
//! - [`mcp`] - MCP server configuration
//! - [`messages`] - Message and content block types
//! - [`agent`] - Agent definitions and system prompts
//! - [`options`] - Session configuration

pub mod agent;
pub mod hooks;
pub mod identifiers;
pub mod mcp;
pub mod messages;
pub mod options;
pub mod permissions;

pub use identifiers::{RequestId, SessionId, ToolName};
pub use permissions::{
    CanUseToolCallback, PermissionBehavior, PermissionMode, PermissionResult,
    PermissionResultAllow, PermissionResultDeny, PermissionRuleValue, PermissionUpdate,
    PermissionUpdateDestination, SettingSource, ToolPermissionContext,
};
