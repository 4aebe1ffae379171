//! Permission-related type definitions
//!
//! This module contains types for managing permissions, including permission modes,
//! permission rules, permission requests, and permission results.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::identifiers::ToolName;
use crate::error::Result;

// ============================================================================
// Permission Types
// ============================================================================

/// Permission modes for tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Default mode - CLI prompts for dangerous tools
    Default,
    /// Auto-accept file edits
    AcceptEdits,
    /// Plan mode
    Plan,
    /// Allow all tools (use with caution)
    BypassPermissions,
}

impl PermissionMode {
    /// Wire name of the mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::Plan => "plan",
            Self::BypassPermissions => "bypassPermissions",
        }
    }
}

/// Setting source types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingSource {
    /// User-level settings
    User,
    /// Project-level settings
    Project,
    /// Local settings
    Local,
}

/// Permission update destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionUpdateDestination {
    /// Save to user settings
    UserSettings,
    /// Save to project settings
    ProjectSettings,
    /// Save to local settings
    LocalSettings,
    /// Save to session only (temporary)
    Session,
}

/// Permission behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionBehavior {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
    /// Ask the user
    Ask,
}

/// Permission rule value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRuleValue {
    /// Name of the tool
    pub tool_name: String,
    /// Optional rule content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_content: Option<String>,
}

/// Permission update configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PermissionUpdate {
    /// Add permission rules
    AddRules {
        /// Rules to add
        #[serde(skip_serializing_if = "Option::is_none")]
        rules: Option<Vec<PermissionRuleValue>>,
        /// Behavior the rules grant
        #[serde(skip_serializing_if = "Option::is_none")]
        behavior: Option<PermissionBehavior>,
        /// Where to save the rules
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PermissionUpdateDestination>,
    },
    /// Replace existing permission rules
    ReplaceRules {
        /// New rules
        #[serde(skip_serializing_if = "Option::is_none")]
        rules: Option<Vec<PermissionRuleValue>>,
        /// Behavior the rules grant
        #[serde(skip_serializing_if = "Option::is_none")]
        behavior: Option<PermissionBehavior>,
        /// Where to save the rules
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PermissionUpdateDestination>,
    },
    /// Remove permission rules
    RemoveRules {
        /// Rules to remove
        #[serde(skip_serializing_if = "Option::is_none")]
        rules: Option<Vec<PermissionRuleValue>>,
        /// Behavior the rules granted
        #[serde(skip_serializing_if = "Option::is_none")]
        behavior: Option<PermissionBehavior>,
        /// Where to remove from
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PermissionUpdateDestination>,
    },
    /// Set permission mode
    SetMode {
        /// New permission mode
        mode: PermissionMode,
        /// Where to save the mode
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PermissionUpdateDestination>,
    },
    /// Add directories to allowed list
    AddDirectories {
        /// Directories to add
        #[serde(skip_serializing_if = "Option::is_none")]
        directories: Option<Vec<String>>,
        /// Where to save
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PermissionUpdateDestination>,
    },
    /// Remove directories from allowed list
    RemoveDirectories {
        /// Directories to remove
        #[serde(skip_serializing_if = "Option::is_none")]
        directories: Option<Vec<String>>,
        /// Where to remove from
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PermissionUpdateDestination>,
    },
}

/// Context for tool permission callbacks
#[derive(Debug, Clone, Default)]
pub struct ToolPermissionContext {
    /// Permission suggestions from CLI
    pub suggestions: Vec<PermissionUpdate>,
    /// Path outside the allowed directories that triggered the prompt, if any
    pub blocked_path: Option<String>,
}

/// Permission result for allowing tool use
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionResultAllow {
    /// Modified input for the tool
    pub updated_input: Option<serde_json::Value>,
    /// Permission updates to apply
    pub updated_permissions: Option<Vec<PermissionUpdate>>,
}

/// Permission result for denying tool use
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionResultDeny {
    /// Reason for denying
    pub message: String,
    /// Whether to interrupt the conversation
    pub interrupt: bool,
}

/// Outcome of a permission check
#[derive(Debug, Clone, PartialEq)]
pub enum PermissionResult {
    /// Allow the tool use
    Allow(PermissionResultAllow),
    /// Deny the tool use
    Deny(PermissionResultDeny),
}

impl PermissionResult {
    /// Allow with the original input
    #[must_use]
    pub fn allow() -> Self {
        Self::Allow(PermissionResultAllow::default())
    }

    /// Deny without interrupting the conversation
    pub fn deny(message: impl Into<String>) -> Self {
        Self::Deny(PermissionResultDeny {
            message: message.into(),
            interrupt: false,
        })
    }

    /// Reply payload for a `can_use_tool` request
    ///
    /// An allow without `updated_input` echoes `original_input` back.
    ///
    /// # Errors
    /// Returns error if permission updates cannot be serialized
    pub fn to_response(&self, original_input: &serde_json::Value) -> Result<serde_json::Value> {
        match self {
            Self::Allow(allow) => {
                let mut response = serde_json::json!({
                    "behavior": "allow",
                    "updatedInput": allow.updated_input.as_ref().unwrap_or(original_input),
                });
                if let Some(ref updates) = allow.updated_permissions {
                    response["updatedPermissions"] = serde_json::to_value(updates)?;
                }
                Ok(response)
            }
            Self::Deny(deny) => Ok(serde_json::json!({
                "behavior": "deny",
                "message": deny.message,
                "interrupt": deny.interrupt,
            })),
        }
    }
}

/// Callback type for tool permission checks
pub type CanUseToolCallback = Arc<
    dyn Fn(
            ToolName,
            serde_json::Value,
            ToolPermissionContext,
        ) -> Pin<Box<dyn Future<Output = Result<PermissionResult>> + Send>>
        + Send
        + Sync,
>;
