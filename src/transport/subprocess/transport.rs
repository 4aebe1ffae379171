//! Subprocess transport implementation using Claude Code CLI

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::Transport;
use crate::error::{ClaudeError, Result};
use crate::transport::framing::DEFAULT_MAX_BUFFER_SIZE;
use crate::types::options::ClaudeAgentOptions;

use super::config::StderrTail;

/// Subprocess transport for Claude Code CLI
pub struct SubprocessTransport {
    pub(super) options: ClaudeAgentOptions,
    pub(super) cli_path: PathBuf,
    /// Shared with the reader task, which reaps the child at end of stream
    pub(super) process: Arc<Mutex<Option<Child>>>,
    pub(super) stdin: Option<ChildStdin>,
    pub(super) stdout: Option<ChildStdout>,
    pub(super) ready: Arc<AtomicBool>,
    pub(super) max_buffer_size: usize,
    pub(super) stderr_tail: Arc<StderrTail>,
    pub(super) reader_task: Option<JoinHandle<()>>,
    pub(super) stderr_task: Option<JoinHandle<()>>,
}

impl SubprocessTransport {
    /// Create a new subprocess transport
    ///
    /// # Arguments
    /// * `options` - Configuration options
    /// * `cli_path` - Optional path to Claude Code CLI (will search if None)
    ///
    /// # Errors
    /// Returns `ClaudeError::CliNotFound` if no path is given and the CLI cannot be found
    pub fn new(options: ClaudeAgentOptions, cli_path: Option<PathBuf>) -> Result<Self> {
        let cli_path = match cli_path {
            Some(path) => path,
            None => Self::find_cli()?,
        };

        let max_buffer_size = options.max_buffer_size.unwrap_or(DEFAULT_MAX_BUFFER_SIZE);
        let stderr_tail = Arc::new(StderrTail::new(options.stderr_tail_lines));

        Ok(Self {
            options,
            cli_path,
            process: Arc::new(Mutex::new(None)),
            stdin: None,
            stdout: None,
            ready: Arc::new(AtomicBool::new(false)),
            max_buffer_size,
            stderr_tail,
            reader_task: None,
            stderr_task: None,
        })
    }

    /// Find Claude Code CLI binary
    ///
    /// # Errors
    /// Returns error if CLI cannot be found in PATH or common locations
    pub fn find_cli() -> Result<PathBuf> {
        if let Ok(path) = which::which("claude") {
            return Ok(path);
        }

        let Some(home) = env::var_os("HOME").map(PathBuf::from) else {
            return Err(ClaudeError::cli_not_found());
        };
        let locations = [
            home.join(".npm-global/bin/claude"),
            PathBuf::from("/usr/local/bin/claude"),
            home.join(".local/bin/claude"),
            home.join("node_modules/.bin/claude"),
            home.join(".yarn/bin/claude"),
            home.join(".claude/local/claude"),
        ];

        locations
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(ClaudeError::cli_not_found)
    }

    /// Path of the CLI this transport runs
    #[must_use]
    pub fn cli_path(&self) -> &std::path::Path {
        &self.cli_path
    }

    /// The most recent stderr lines, joined by newlines
    #[must_use]
    pub fn stderr_tail(&self) -> Option<String> {
        self.stderr_tail.snapshot()
    }
}

impl Transport for SubprocessTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_impl().await
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(ClaudeError::transport("Transport is not ready for writing"));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ClaudeError::transport("stdin not available"))?;

        stdin
            .write_all(data.as_bytes())
            .await
            .map_err(|e| ClaudeError::transport(format!("Failed to write to stdin: {e}")))?;

        stdin
            .flush()
            .await
            .map_err(|e| ClaudeError::transport(format!("Failed to flush stdin: {e}")))?;

        Ok(())
    }

    async fn end_input(&mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .shutdown()
                .await
                .map_err(|e| ClaudeError::transport(format!("Failed to close stdin: {e}")))?;
        }
        Ok(())
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>> {
        self.read_messages_impl()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.close_impl().await
    }
}

impl Drop for SubprocessTransport {
    fn drop(&mut self) {
        self.drop_impl();
    }
}
