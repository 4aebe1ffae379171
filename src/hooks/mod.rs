//! Hook system for intercepting agent events
//!
//! Hooks are registered per [`HookEvent`] behind an optional tool-name
//! matcher. When the CLI reports an event, every matching callback runs in
//! registration order and the outputs are folded into a single decision.
//!
//! ```rust
//! use kodegen_claude_runtime::hooks::{HookManager, HookMatcherBuilder};
//! use kodegen_claude_runtime::{HookEvent, HookOutput};
//!
//! let manager = HookManager::new();
//! let guard = HookManager::callback(|input, _tool_use_id, _context| async move {
//!     let command = input["tool_input"]["command"].as_str().unwrap_or_default();
//!     if command.contains("rm -rf") {
//!         return Ok(HookOutput::deny(HookEvent::PreToolUse, "destructive command"));
//!     }
//!     Ok(HookOutput::default())
//! });
//! manager.register(
//!     HookEvent::PreToolUse,
//!     HookMatcherBuilder::new(Some("Bash")).add_hook(guard).build(),
//! );
//! assert!(!manager.is_empty());
//! ```

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;

use crate::error::{ClaudeError, Result};
use crate::types::hooks::{HookCallback, HookContext, HookEvent, HookMatcher, HookOutput};
use crate::types::identifiers::ToolName;

/// Hook manager for registering and dispatching hooks
pub struct HookManager {
    /// Registered matchers per event, in registration order
    registrations: Mutex<HashMap<HookEvent, Vec<HookMatcher>>>,
}

impl HookManager {
    /// Create a new hook manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(HashMap::new()),
        }
    }

    /// Create a manager pre-populated from configuration
    #[must_use]
    pub fn from_config(hooks: &HashMap<HookEvent, Vec<HookMatcher>>) -> Self {
        let manager = Self::new();
        // Iterate in a fixed event order so registration order is stable
        for event in HookEvent::ALL {
            for matcher in hooks.get(&event).into_iter().flatten() {
                manager.register(event, matcher.clone());
            }
        }
        manager
    }

    /// Register a matcher for an event
    ///
    /// # Arguments
    /// * `event` - Event the matcher listens to
    /// * `matcher` - Hook matcher configuration
    pub fn register(&self, event: HookEvent, matcher: HookMatcher) {
        self.registrations
            .lock()
            .entry(event)
            .or_default()
            .push(matcher);
    }

    /// Whether no hooks are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations
            .lock()
            .values()
            .all(|matchers| matchers.iter().all(|m| m.hooks.is_empty()))
    }

    /// Events that have at least one hook registered
    #[must_use]
    pub fn registered_events(&self) -> Vec<HookEvent> {
        let registrations = self.registrations.lock();
        HookEvent::ALL
            .into_iter()
            .filter(|event| {
                registrations
                    .get(event)
                    .is_some_and(|matchers| matchers.iter().any(|m| !m.hooks.is_empty()))
            })
            .collect()
    }

    /// Hook configuration for the `initialize` request
    ///
    /// Each registered event is advertised with a single callback id and no
    /// matcher; matching happens locally in [`HookManager::dispatch`].
    #[must_use]
    pub fn initialize_config(&self) -> Option<serde_json::Value> {
        let events = self.registered_events();
        if events.is_empty() {
            return None;
        }

        let config: serde_json::Map<String, serde_json::Value> = events
            .into_iter()
            .map(|event| {
                (
                    event.as_str().to_string(),
                    serde_json::json!([{
                        "matcher": null,
                        "hookCallbackIds": [event.callback_id()],
                    }]),
                )
            })
            .collect();
        Some(serde_json::Value::Object(config))
    }

    /// Dispatch an event to every matching hook
    ///
    /// Hooks run one after another in registration order, each seeing the
    /// original input. The first output that denies ends dispatch and is
    /// returned as is. Otherwise outputs are merged, later values winning.
    /// A hook that fails or panics counts as having no opinion.
    pub async fn dispatch(
        &self,
        event: HookEvent,
        tool_name: Option<&str>,
        input: serde_json::Value,
        tool_use_id: Option<String>,
    ) -> HookOutput {
        // Clone the callbacks out so the lock is not held across hook execution
        let callbacks: Vec<HookCallback> = self
            .registrations
            .lock()
            .get(&event)
            .map(|matchers| {
                matchers
                    .iter()
                    .filter(|matcher| matcher.matches(tool_name))
                    .flat_map(|matcher| matcher.hooks.iter().cloned())
                    .collect()
            })
            .unwrap_or_default();

        let context = HookContext {
            event,
            tool_name: tool_name.map(ToolName::from),
        };

        let mut merged = HookOutput::default();
        for (index, hook) in callbacks.iter().enumerate() {
            let outcome = AssertUnwindSafe(async {
                hook.call(input.clone(), tool_use_id.clone(), context.clone())
                    .await
            })
            .catch_unwind()
            .await;

            let output = match outcome {
                Ok(Ok(output)) => output,
                Ok(Err(e)) => {
                    log::warn!("{} hook #{index} failed, ignoring: {e}", event.as_str());
                    continue;
                }
                Err(_) => {
                    log::warn!("{} hook #{index} panicked, ignoring", event.as_str());
                    continue;
                }
            };

            if output.is_deny() {
                log::debug!(
                    "{} hook #{index} denied {}",
                    event.as_str(),
                    tool_name.unwrap_or("<no tool>")
                );
                return output;
            }
            merged = merged.merge(output);
        }

        merged
    }

    /// Handle a `hook_callback` control request
    ///
    /// The event comes from the callback id, falling back to the
    /// `hook_event_name` field of the input.
    ///
    /// # Errors
    /// Returns `ClaudeError::Hook` if the event cannot be determined
    pub async fn handle_callback(
        &self,
        callback_id: Option<&str>,
        input: serde_json::Value,
        tool_use_id: Option<String>,
    ) -> Result<HookOutput> {
        let event = callback_id
            .and_then(HookEvent::from_callback_id)
            .or_else(|| {
                input
                    .get("hook_event_name")
                    .and_then(serde_json::Value::as_str)
                    .and_then(HookEvent::from_name)
            })
            .ok_or_else(|| {
                ClaudeError::hook(format!(
                    "No hook registered for callback {}",
                    callback_id.unwrap_or("<none>")
                ))
            })?;

        let tool_name = input
            .get("tool_name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        Ok(self
            .dispatch(event, tool_name.as_deref(), input, tool_use_id)
            .await)
    }

    /// Create a hook callback from a closure
    pub fn callback<F, Fut>(f: F) -> HookCallback
    where
        F: Fn(serde_json::Value, Option<String>, HookContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<HookOutput>> + Send + 'static,
    {
        Arc::new(f)
    }
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating hook matchers
pub struct HookMatcherBuilder {
    matcher: Option<String>,
    hooks: Vec<HookCallback>,
}

impl HookMatcherBuilder {
    /// Create a new hook matcher builder
    ///
    /// # Arguments
    /// * `pattern` - Matcher pattern (None for all, or specific tool name/pattern)
    pub fn new(pattern: Option<impl Into<String>>) -> Self {
        Self {
            matcher: pattern.map(std::convert::Into::into),
            hooks: Vec::new(),
        }
    }

    /// Add a hook callback
    #[must_use]
    pub fn add_hook(mut self, hook: HookCallback) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Build the hook matcher
    #[must_use]
    pub fn build(self) -> HookMatcher {
        HookMatcher {
            matcher: self.matcher,
            hooks: self.hooks,
        }
    }
}
