//! Permission system for tool access control
//!
//! Answers `can_use_tool` requests from the CLI: static allow/deny lists are
//! checked first, then the user's callback decides.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::identifiers::ToolName;
use crate::types::permissions::{
    CanUseToolCallback, PermissionResult, PermissionUpdate, ToolPermissionContext,
};

/// Permission manager for tool access control
pub struct PermissionManager {
    /// Tool permission callback
    callback: Option<CanUseToolCallback>,
    /// Allowed tools (None = all allowed)
    allowed_tools: Option<Vec<ToolName>>,
    /// Disallowed tools
    disallowed_tools: Vec<ToolName>,
}

impl PermissionManager {
    /// Create a new permission manager
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callback: None,
            allowed_tools: None,
            disallowed_tools: Vec::new(),
        }
    }

    /// Create a builder
    #[must_use]
    pub fn builder() -> PermissionManagerBuilder {
        PermissionManagerBuilder::default()
    }

    /// Whether a user callback is configured
    #[must_use]
    pub const fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Check if a tool can be used
    ///
    /// # Arguments
    /// * `tool_name` - Name of the tool
    /// * `tool_input` - Tool input parameters
    /// * `context` - Permission context
    ///
    /// # Errors
    /// Returns the callback's error, if it fails
    pub async fn can_use_tool(
        &self,
        tool_name: ToolName,
        tool_input: serde_json::Value,
        context: ToolPermissionContext,
    ) -> Result<PermissionResult> {
        if self.disallowed_tools.contains(&tool_name) {
            return Ok(PermissionResult::deny(format!(
                "Tool {tool_name} is disallowed"
            )));
        }

        if let Some(ref allowed) = self.allowed_tools
            && !allowed.contains(&tool_name)
        {
            return Ok(PermissionResult::deny(format!(
                "Tool {tool_name} is not in allowed list"
            )));
        }

        match self.callback {
            Some(ref callback) => callback(tool_name, tool_input, context).await,
            None => Ok(PermissionResult::allow()),
        }
    }

    /// Handle a `can_use_tool` control request, producing the reply payload
    ///
    /// Suggestions the CLI sends in a shape this crate does not know are dropped.
    ///
    /// # Errors
    /// Returns the callback's error, if it fails
    pub async fn handle_request(
        &self,
        tool_name: ToolName,
        input: serde_json::Value,
        permission_suggestions: Option<Vec<serde_json::Value>>,
        blocked_path: Option<String>,
    ) -> Result<serde_json::Value> {
        let suggestions = permission_suggestions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<PermissionUpdate>(raw).ok())
            .collect();
        let context = ToolPermissionContext {
            suggestions,
            blocked_path,
        };

        let result = self
            .can_use_tool(tool_name.clone(), input.clone(), context)
            .await?;
        log::debug!(
            "Permission for {tool_name}: {}",
            if matches!(result, PermissionResult::Allow(_)) {
                "allow"
            } else {
                "deny"
            }
        );
        result.to_response(&input)
    }

    /// Create a permission callback from a closure
    pub fn callback<F, Fut>(f: F) -> CanUseToolCallback
    where
        F: Fn(ToolName, serde_json::Value, ToolPermissionContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<PermissionResult>> + Send + 'static,
    {
        Arc::new(
            move |tool_name: ToolName,
                  tool_input: serde_json::Value,
                  context: ToolPermissionContext|
                  -> BoxFuture<'static, Result<PermissionResult>> {
                Box::pin(f(tool_name, tool_input, context))
            },
        )
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for permission manager
#[derive(Default)]
pub struct PermissionManagerBuilder {
    callback: Option<CanUseToolCallback>,
    allowed_tools: Option<Vec<ToolName>>,
    disallowed_tools: Vec<ToolName>,
}

impl PermissionManagerBuilder {
    /// Set the permission callback
    #[must_use]
    pub fn callback(mut self, callback: CanUseToolCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Set allowed tools
    #[must_use]
    pub fn allowed_tools(mut self, tools: Vec<ToolName>) -> Self {
        self.allowed_tools = Some(tools);
        self
    }

    /// Set disallowed tools
    #[must_use]
    pub fn disallowed_tools(mut self, tools: Vec<ToolName>) -> Self {
        self.disallowed_tools = tools;
        self
    }

    /// Build the permission manager
    #[must_use]
    pub fn build(self) -> PermissionManager {
        PermissionManager {
            callback: self.callback,
            allowed_tools: self.allowed_tools,
            disallowed_tools: self.disallowed_tools,
        }
    }
}
