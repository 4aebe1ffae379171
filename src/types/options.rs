//! Claude Agent options and configuration
//!
//! This module contains the main configuration options for a session,
//! including a builder pattern for easy configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::agent::{AgentDefinition, SystemPrompt};
use super::hooks::{HookEvent, HookMatcher};
use super::identifiers::{SessionId, ToolName};
use super::mcp::{McpServerConfig, McpServers};
use super::permissions::{CanUseToolCallback, PermissionMode, SettingSource};
use crate::error::{ClaudeError, Result};

/// Upper bound accepted for `max_turns`
pub const MAX_ALLOWED_TURNS: u32 = 1000;
/// Default timeout for outbound control requests
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(60);
/// Default timeout for the `initialize` handshake
pub const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(60);
/// Default grace period for the CLI to exit after stdin closes
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of stderr lines kept for error reports
pub const DEFAULT_STDERR_TAIL_LINES: usize = 100;

/// Callback receiving each line the CLI writes to stderr
pub type StderrCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Main options for a Claude session
#[derive(Clone)]
pub struct ClaudeAgentOptions {
    /// List of tools that Claude is allowed to use
    pub allowed_tools: Vec<ToolName>,
    /// System prompt configuration
    pub system_prompt: Option<SystemPrompt>,
    /// MCP server configurations
    pub mcp_servers: McpServers,
    /// Permission mode for tool execution
    pub permission_mode: Option<PermissionMode>,
    /// Whether to continue from the previous conversation
    pub continue_conversation: bool,
    /// Session ID to resume from
    pub resume: Option<SessionId>,
    /// Maximum number of turns before stopping
    pub max_turns: Option<u32>,
    /// List of tools that Claude is not allowed to use
    pub disallowed_tools: Vec<ToolName>,
    /// AI model to use
    pub model: Option<String>,
    /// Tool name to use for permission prompts
    pub permission_prompt_tool_name: Option<String>,
    /// Working directory for the CLI process
    pub cwd: Option<PathBuf>,
    /// Path to settings file
    pub settings: Option<PathBuf>,
    /// Additional directories to add to the context
    pub add_dirs: Vec<PathBuf>,
    /// Environment variables for the CLI process
    pub env: HashMap<String, String>,
    /// Extra CLI arguments to pass (allow-listed)
    pub extra_args: HashMap<String, Option<String>>,
    /// Maximum buffer size for JSON messages (default: 1MB)
    pub max_buffer_size: Option<usize>,
    /// Callback for tool permission checks
    pub can_use_tool: Option<CanUseToolCallback>,
    /// Hook configurations
    pub hooks: Option<HashMap<HookEvent, Vec<HookMatcher>>>,
    /// Whether to include partial messages in stream
    pub include_partial_messages: bool,
    /// Whether to fork the session when resuming
    pub fork_session: bool,
    /// Custom agent definitions
    pub agents: Option<HashMap<String, AgentDefinition>>,
    /// Setting sources to load
    pub setting_sources: Option<Vec<SettingSource>>,
    /// Timeout for outbound control requests
    pub control_timeout: Duration,
    /// Timeout for the `initialize` handshake
    pub initialize_timeout: Duration,
    /// Grace period between closing stdin and killing the CLI
    pub close_timeout: Duration,
    /// Number of stderr lines kept for error reports
    pub stderr_tail_lines: usize,
    /// Callback for stderr lines
    pub stderr: Option<StderrCallback>,
}

impl Default for ClaudeAgentOptions {
    fn default() -> Self {
        Self {
            allowed_tools: Vec::new(),
            system_prompt: None,
            mcp_servers: McpServers::None,
            permission_mode: None,
            continue_conversation: false,
            resume: None,
            max_turns: None,
            disallowed_tools: Vec::new(),
            model: None,
            permission_prompt_tool_name: None,
            cwd: None,
            settings: None,
            add_dirs: Vec::new(),
            env: HashMap::new(),
            extra_args: HashMap::new(),
            max_buffer_size: None,
            can_use_tool: None,
            hooks: None,
            include_partial_messages: false,
            fork_session: false,
            agents: None,
            setting_sources: None,
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
            initialize_timeout: DEFAULT_INITIALIZE_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            stderr_tail_lines: DEFAULT_STDERR_TAIL_LINES,
            stderr: None,
        }
    }
}

impl ClaudeAgentOptions {
    /// Create a new builder for `ClaudeAgentOptions`
    #[must_use]
    pub fn builder() -> ClaudeAgentOptionsBuilder {
        ClaudeAgentOptionsBuilder::default()
    }

    /// Check the options before a session starts
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` for out of range values or
    /// conflicting permission settings
    pub fn validate(&self) -> Result<()> {
        if let Some(turns) = self.max_turns
            && turns > MAX_ALLOWED_TURNS
        {
            return Err(ClaudeError::invalid_config(format!(
                "max_turns {turns} exceeds maximum allowed: {MAX_ALLOWED_TURNS}"
            )));
        }

        if self.max_buffer_size == Some(0) {
            return Err(ClaudeError::invalid_config("max_buffer_size must be positive"));
        }

        if self.can_use_tool.is_some() && self.permission_prompt_tool_name.is_some() {
            return Err(ClaudeError::invalid_config(
                "can_use_tool cannot be combined with permission_prompt_tool_name",
            ));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ClaudeAgentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeAgentOptions")
            .field("allowed_tools", &self.allowed_tools)
            .field("system_prompt", &self.system_prompt)
            .field("mcp_servers", &self.mcp_servers)
            .field("permission_mode", &self.permission_mode)
            .field("continue_conversation", &self.continue_conversation)
            .field("resume", &self.resume)
            .field("max_turns", &self.max_turns)
            .field("disallowed_tools", &self.disallowed_tools)
            .field("model", &self.model)
            .field(
                "permission_prompt_tool_name",
                &self.permission_prompt_tool_name,
            )
            .field("cwd", &self.cwd)
            .field("settings", &self.settings)
            .field("add_dirs", &self.add_dirs)
            .field("env", &self.env)
            .field("extra_args", &self.extra_args)
            .field("max_buffer_size", &self.max_buffer_size)
            .field(
                "can_use_tool",
                &self.can_use_tool.as_ref().map(|_| "<callback>"),
            )
            .field(
                "hooks",
                &self
                    .hooks
                    .as_ref()
                    .map(|h| format!("[{} hook types]", h.len())),
            )
            .field("include_partial_messages", &self.include_partial_messages)
            .field("fork_session", &self.fork_session)
            .field("agents", &self.agents)
            .field("setting_sources", &self.setting_sources)
            .field("control_timeout", &self.control_timeout)
            .field("initialize_timeout", &self.initialize_timeout)
            .field("close_timeout", &self.close_timeout)
            .field("stderr_tail_lines", &self.stderr_tail_lines)
            .field("stderr", &self.stderr.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

/// Builder for `ClaudeAgentOptions`
#[derive(Debug, Default)]
pub struct ClaudeAgentOptionsBuilder {
    options: ClaudeAgentOptions,
}

impl ClaudeAgentOptionsBuilder {
    /// Set allowed tools
    #[must_use]
    pub fn allowed_tools(mut self, tools: Vec<impl Into<ToolName>>) -> Self {
        self.options.allowed_tools = tools.into_iter().map(std::convert::Into::into).collect();
        self
    }

    /// Add an allowed tool
    #[must_use]
    pub fn add_allowed_tool(mut self, tool: impl Into<ToolName>) -> Self {
        self.options.allowed_tools.push(tool.into());
        self
    }

    /// Set disallowed tools
    #[must_use]
    pub fn disallowed_tools(mut self, tools: Vec<impl Into<ToolName>>) -> Self {
        self.options.disallowed_tools = tools.into_iter().map(std::convert::Into::into).collect();
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<SystemPrompt>) -> Self {
        self.options.system_prompt = Some(prompt.into());
        self
    }

    /// Set MCP servers
    #[must_use]
    pub fn mcp_servers(mut self, servers: HashMap<String, McpServerConfig>) -> Self {
        self.options.mcp_servers = McpServers::Dict(servers);
        self
    }

    /// Add one MCP server
    #[must_use]
    pub fn add_mcp_server(mut self, name: impl Into<String>, config: McpServerConfig) -> Self {
        self.options.mcp_servers = std::mem::take(&mut self.options.mcp_servers).with(name, config);
        self
    }

    /// Read MCP servers from a configuration file
    #[must_use]
    pub fn mcp_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.mcp_servers = McpServers::Path(path.into());
        self
    }

    /// Set permission mode
    #[must_use]
    pub const fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.options.permission_mode = Some(mode);
        self
    }

    /// Continue the most recent conversation
    #[must_use]
    pub const fn continue_conversation(mut self, value: bool) -> Self {
        self.options.continue_conversation = value;
        self
    }

    /// Resume a session
    #[must_use]
    pub fn resume(mut self, session_id: impl Into<SessionId>) -> Self {
        self.options.resume = Some(session_id.into());
        self
    }

    /// Set max turns (checked against [`MAX_ALLOWED_TURNS`] at connect)
    #[must_use]
    pub const fn max_turns(mut self, turns: u32) -> Self {
        self.options.max_turns = Some(turns);
        self
    }

    /// Set the model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    /// Route permission prompts through an MCP tool
    #[must_use]
    pub fn permission_prompt_tool_name(mut self, tool: impl Into<String>) -> Self {
        self.options.permission_prompt_tool_name = Some(tool.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Set settings file
    #[must_use]
    pub fn settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.settings = Some(path.into());
        self
    }

    /// Add a directory to the context
    #[must_use]
    pub fn add_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.add_dirs.push(path.into());
        self
    }

    /// Set an environment variable for the CLI process
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Pass an extra CLI flag
    #[must_use]
    pub fn extra_arg(mut self, flag: impl Into<String>, value: Option<String>) -> Self {
        self.options.extra_args.insert(flag.into(), value);
        self
    }

    /// Set maximum line length accepted from the CLI
    #[must_use]
    pub const fn max_buffer_size(mut self, size: usize) -> Self {
        self.options.max_buffer_size = Some(size);
        self
    }

    /// Set `can_use_tool` callback
    #[must_use]
    pub fn can_use_tool(mut self, callback: CanUseToolCallback) -> Self {
        self.options.can_use_tool = Some(callback);
        self
    }

    /// Set hooks
    #[must_use]
    pub fn hooks(mut self, hooks: HashMap<HookEvent, Vec<HookMatcher>>) -> Self {
        self.options.hooks = Some(hooks);
        self
    }

    /// Add a hook matcher for an event
    #[must_use]
    pub fn add_hook(mut self, event: HookEvent, matcher: HookMatcher) -> Self {
        self.options
            .hooks
            .get_or_insert_with(HashMap::new)
            .entry(event)
            .or_default()
            .push(matcher);
        self
    }

    /// Include partial (streaming) messages
    #[must_use]
    pub const fn include_partial_messages(mut self, value: bool) -> Self {
        self.options.include_partial_messages = value;
        self
    }

    /// Fork the session when resuming
    #[must_use]
    pub const fn fork_session(mut self, value: bool) -> Self {
        self.options.fork_session = value;
        self
    }

    /// Define a subagent
    #[must_use]
    pub fn agent(mut self, name: impl Into<String>, definition: AgentDefinition) -> Self {
        self.options
            .agents
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), definition);
        self
    }

    /// Set setting sources
    #[must_use]
    pub fn setting_sources(mut self, sources: Vec<SettingSource>) -> Self {
        self.options.setting_sources = Some(sources);
        self
    }

    /// Set control request timeout
    #[must_use]
    pub const fn control_timeout(mut self, timeout: Duration) -> Self {
        self.options.control_timeout = timeout;
        self
    }

    /// Set `initialize` handshake timeout
    #[must_use]
    pub const fn initialize_timeout(mut self, timeout: Duration) -> Self {
        self.options.initialize_timeout = timeout;
        self
    }

    /// Set close grace period
    #[must_use]
    pub const fn close_timeout(mut self, timeout: Duration) -> Self {
        self.options.close_timeout = timeout;
        self
    }

    /// Set number of stderr lines kept
    #[must_use]
    pub const fn stderr_tail_lines(mut self, lines: usize) -> Self {
        self.options.stderr_tail_lines = lines;
        self
    }

    /// Set stderr callback
    #[must_use]
    pub fn stderr<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.options.stderr = Some(Arc::new(callback));
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ClaudeAgentOptions {
        self.options
    }
}
