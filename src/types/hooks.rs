//! Hook-related type definitions
//!
//! This module contains types for managing hooks, including hook events,
//! hook decisions, hook outputs, and hook callbacks.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

use super::identifiers::ToolName;
use crate::error::Result;

// ============================================================================
// Hook Types
// ============================================================================

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    /// Before a tool is used
    PreToolUse,
    /// After a tool is used
    PostToolUse,
    /// When user submits a prompt
    UserPromptSubmit,
    /// When conversation stops
    Stop,
    /// When a subagent stops
    SubagentStop,
    /// Before compacting the conversation
    PreCompact,
}

impl HookEvent {
    /// All events, in the order they are advertised to the CLI
    pub const ALL: [Self; 6] = [
        Self::PreToolUse,
        Self::PostToolUse,
        Self::UserPromptSubmit,
        Self::Stop,
        Self::SubagentStop,
        Self::PreCompact,
    ];

    /// Wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
            Self::PreCompact => "PreCompact",
        }
    }

    /// Look up an event by its wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }

    /// Callback id the CLI echoes back in `hook_callback` requests for this event
    #[must_use]
    pub fn callback_id(self) -> String {
        format!("hook_{}", self.as_str())
    }

    /// Inverse of [`HookEvent::callback_id`]
    #[must_use]
    pub fn from_callback_id(callback_id: &str) -> Option<Self> {
        callback_id.strip_prefix("hook_").and_then(Self::from_name)
    }
}

/// Hook decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookDecision {
    /// Block the action
    Block,
}

/// Hook output
///
/// Every field is optional; an all-empty output means "no opinion".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookOutput {
    /// Whether the agent should continue after the hook
    #[serde(skip_serializing_if = "Option::is_none", rename = "continue")]
    pub continue_: Option<bool>,
    /// Hide the hook's output from the transcript
    #[serde(skip_serializing_if = "Option::is_none", rename = "suppressOutput")]
    pub suppress_output: Option<bool>,
    /// Message shown when `continue` is false
    #[serde(skip_serializing_if = "Option::is_none", rename = "stopReason")]
    pub stop_reason: Option<String>,
    /// Decision to block or allow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<HookDecision>,
    /// System message to add
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemMessage")]
    pub system_message: Option<String>,
    /// Explanation for the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Hook-specific output data
    #[serde(skip_serializing_if = "Option::is_none", rename = "hookSpecificOutput")]
    pub hook_specific_output: Option<serde_json::Value>,
}

impl HookOutput {
    /// Output denying a tool use for `event`
    pub fn deny(event: HookEvent, reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: Some(serde_json::json!({
                "hookEventName": event.as_str(),
                "permissionDecision": "deny",
                "permissionDecisionReason": reason.into(),
            })),
            ..Self::default()
        }
    }

    /// Output explicitly allowing a tool use for `event`
    pub fn allow(event: HookEvent, reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: Some(serde_json::json!({
                "hookEventName": event.as_str(),
                "permissionDecision": "allow",
                "permissionDecisionReason": reason.into(),
            })),
            ..Self::default()
        }
    }

    /// Output with a system message only
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            system_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether this output vetoes the action
    #[must_use]
    pub fn is_deny(&self) -> bool {
        matches!(self.decision, Some(HookDecision::Block))
            || self
                .hook_specific_output
                .as_ref()
                .and_then(|specific| specific.get("permissionDecision"))
                .and_then(serde_json::Value::as_str)
                == Some("deny")
    }

    /// Whether this output expresses no opinion at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine two outputs, `later` winning on every key it sets
    ///
    /// `hookSpecificOutput` objects are merged key by key.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        let hook_specific_output = match (self.hook_specific_output, later.hook_specific_output) {
            (Some(serde_json::Value::Object(mut earlier)), Some(serde_json::Value::Object(newer))) => {
                earlier.extend(newer);
                Some(serde_json::Value::Object(earlier))
            }
            (earlier, newer) => newer.or(earlier),
        };

        Self {
            continue_: later.continue_.or(self.continue_),
            suppress_output: later.suppress_output.or(self.suppress_output),
            stop_reason: later.stop_reason.or(self.stop_reason),
            decision: later.decision.or(self.decision),
            system_message: later.system_message.or(self.system_message),
            reason: later.reason.or(self.reason),
            hook_specific_output,
        }
    }
}

/// Context for hook callbacks
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Event being dispatched
    pub event: HookEvent,
    /// Tool the event concerns, for tool events
    pub tool_name: Option<ToolName>,
}

/// A hook implementation
///
/// Implemented for any `Fn(input, tool_use_id, context) -> impl Future<Output = Result<HookOutput>>`,
/// so plain async closures can be registered directly.
pub trait HookHandler: Send + Sync {
    /// Run the hook
    fn call(
        &self,
        input: serde_json::Value,
        tool_use_id: Option<String>,
        context: HookContext,
    ) -> BoxFuture<'static, Result<HookOutput>>;
}

impl<F, Fut> HookHandler for F
where
    F: Fn(serde_json::Value, Option<String>, HookContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HookOutput>> + Send + 'static,
{
    fn call(
        &self,
        input: serde_json::Value,
        tool_use_id: Option<String>,
        context: HookContext,
    ) -> BoxFuture<'static, Result<HookOutput>> {
        Box::pin(self(input, tool_use_id, context))
    }
}

/// Shared hook callback
pub type HookCallback = Arc<dyn HookHandler>;

/// Hook matcher configuration
#[derive(Clone)]
pub struct HookMatcher {
    /// Matcher pattern (e.g., tool name like "Bash" or pattern like "Write|Edit")
    pub matcher: Option<String>,
    /// List of hook callbacks
    pub hooks: Vec<HookCallback>,
}

impl HookMatcher {
    /// Check if this matcher applies to a tool name
    ///
    /// An absent pattern or `*` matches everything, otherwise the pattern is a
    /// `|`-separated list of exact tool names.
    #[must_use]
    pub fn matches(&self, tool_name: Option<&str>) -> bool {
        match (self.matcher.as_deref(), tool_name) {
            (None | Some("*"), _) => true,
            (Some(pattern), Some(name)) => pattern.split('|').any(|p| p.trim() == name),
            (Some(_), None) => false,
        }
    }
}

impl std::fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookMatcher")
            .field("matcher", &self.matcher)
            .field("hooks", &format!("[{} callbacks]", self.hooks.len()))
            .finish()
    }
}
