//! CLI command building logic for subprocess transport

use tokio::process::Command;

use crate::types::agent::SystemPrompt;
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::SettingSource;

use super::config::ALLOWED_EXTRA_FLAGS;

/// Command builder for Claude CLI
pub struct CommandBuilder<'a> {
    cli_path: &'a std::path::Path,
    options: &'a ClaudeAgentOptions,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    pub const fn new(cli_path: &'a std::path::Path, options: &'a ClaudeAgentOptions) -> Self {
        Self { cli_path, options }
    }

    /// Build the complete CLI command with all arguments
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(self.cli_path);
        cmd.args(self.args());
        cmd
    }

    /// Arguments for a streaming session
    ///
    /// The session always talks stream-json both ways; prompts are sent as
    /// user messages on stdin.
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["--output-format", "stream-json", "--verbose"]
            .into_iter()
            .map(String::from)
            .collect();

        match self.options.system_prompt {
            Some(SystemPrompt::String(ref prompt)) => {
                push_pair(&mut args, "--system-prompt", prompt);
            }
            Some(SystemPrompt::Preset(ref preset)) => {
                if let Some(ref append) = preset.append {
                    push_pair(&mut args, "--append-system-prompt", append);
                }
            }
            None => {}
        }

        self.add_tool_args(&mut args);
        self.add_configuration_args(&mut args);
        self.add_session_args(&mut args);
        self.add_extra_args(&mut args);

        args.push("--input-format".to_string());
        args.push("stream-json".to_string());
        args
    }

    fn add_tool_args(&self, args: &mut Vec<String>) {
        if !self.options.allowed_tools.is_empty() {
            let tools: Vec<&str> = self.options.allowed_tools.iter().map(|t| t.as_str()).collect();
            push_pair(args, "--allowedTools", &tools.join(","));
        }

        if !self.options.disallowed_tools.is_empty() {
            let tools: Vec<&str> = self
                .options
                .disallowed_tools
                .iter()
                .map(|t| t.as_str())
                .collect();
            push_pair(args, "--disallowedTools", &tools.join(","));
        }

        if let Some(config) = self.options.mcp_servers.to_cli_arg() {
            push_pair(args, "--mcp-config", &config);
        }
    }

    /// Model, max turns, permissions
    fn add_configuration_args(&self, args: &mut Vec<String>) {
        if let Some(max_turns) = self.options.max_turns {
            push_pair(args, "--max-turns", &max_turns.to_string());
        }

        if let Some(ref model) = self.options.model {
            push_pair(args, "--model", model);
        }

        // Permission prompts come back as can_use_tool control requests
        if self.options.can_use_tool.is_some() {
            push_pair(args, "--permission-prompt-tool", "stdio");
        } else if let Some(ref tool) = self.options.permission_prompt_tool_name {
            push_pair(args, "--permission-prompt-tool", tool);
        }

        if let Some(mode) = self.options.permission_mode {
            push_pair(args, "--permission-mode", mode.as_str());
        }
    }

    fn add_session_args(&self, args: &mut Vec<String>) {
        if self.options.continue_conversation {
            args.push("--continue".to_string());
        }

        if let Some(ref session_id) = self.options.resume {
            push_pair(args, "--resume", session_id.as_str());
        }

        if let Some(ref settings) = self.options.settings {
            push_pair(args, "--settings", &settings.to_string_lossy());
        }

        for dir in &self.options.add_dirs {
            push_pair(args, "--add-dir", &dir.to_string_lossy());
        }

        if self.options.include_partial_messages {
            args.push("--include-partial-messages".to_string());
        }

        if self.options.fork_session {
            args.push("--fork-session".to_string());
        }

        if let Some(ref agents) = self.options.agents
            && let Ok(agents_json) = serde_json::to_string(agents)
        {
            push_pair(args, "--agents", &agents_json);
        }
    }

    /// Setting sources and allow-listed extra flags
    fn add_extra_args(&self, args: &mut Vec<String>) {
        let sources = self
            .options
            .setting_sources
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|source| match source {
                SettingSource::User => "user",
                SettingSource::Project => "project",
                SettingSource::Local => "local",
            })
            .collect::<Vec<_>>();
        push_pair(args, "--setting-sources", &sources.join(","));

        let mut extra: Vec<_> = self.options.extra_args.iter().collect();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        for (flag, value) in extra {
            if !ALLOWED_EXTRA_FLAGS.contains(&flag.as_str()) {
                log::warn!("Ignoring extra CLI flag --{flag}: not in the allow list");
                continue;
            }
            args.push(format!("--{flag}"));
            if let Some(v) = value {
                args.push(v.clone());
            }
        }
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}
