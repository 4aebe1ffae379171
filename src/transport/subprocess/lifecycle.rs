//! Lifecycle management for subprocess transport (connect, close)

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::ChildStderr;

use crate::VERSION;
use crate::error::{ClaudeError, Result};
use crate::types::options::StderrCallback;

use super::command::CommandBuilder;
use super::config::{DANGEROUS_ENV_VARS, StderrTail};
use super::transport::SubprocessTransport;

impl SubprocessTransport {
    /// Spawn the CLI and take its stdio handles
    ///
    /// # Errors
    /// Returns `ClaudeError::CliNotFound` if the binary does not exist and
    /// `ClaudeError::Connection` for other spawn failures
    pub(super) async fn connect_impl(&mut self) -> Result<()> {
        if self.process.lock().await.is_some() {
            return Ok(());
        }

        let mut cmd = CommandBuilder::new(&self.cli_path, &self.options).build();

        for (key, value) in &self.options.env {
            if DANGEROUS_ENV_VARS.contains(&key.as_str()) {
                log::warn!("Not passing environment variable {key} to the CLI");
                continue;
            }
            cmd.env(key, value);
        }
        cmd.env("CLAUDE_CODE_ENTRYPOINT", "sdk-rust")
            .env("CLAUDE_AGENT_SDK_VERSION", VERSION);

        if let Some(ref cwd) = self.options.cwd {
            cmd.env("PWD", cwd).current_dir(cwd);
        }

        // stderr is piped so the child never touches the parent terminal
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!("Spawning {}", self.cli_path.display());
        let mut child = cmd.spawn().map_err(|e| {
            if let Some(ref cwd) = self.options.cwd
                && !cwd.exists()
            {
                return ClaudeError::connection(format!(
                    "Working directory does not exist: {}",
                    cwd.display()
                ));
            }
            if e.kind() == std::io::ErrorKind::NotFound {
                return ClaudeError::CliNotFound(format!(
                    "Claude Code not found at {}",
                    self.cli_path.display()
                ));
            }
            ClaudeError::connection(format!("Failed to start Claude Code: {e}"))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClaudeError::connection("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeError::connection("Failed to get stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClaudeError::connection("Failed to get stderr handle"))?;

        self.stderr_task = Some(tokio::spawn(capture_stderr(
            stderr,
            Arc::clone(&self.stderr_tail),
            self.options.stderr.clone(),
        )));
        self.stdin = Some(stdin);
        self.stdout = Some(stdout);
        *self.process.lock().await = Some(child);
        self.ready.store(true, Ordering::SeqCst);

        Ok(())
    }

    /// Close stdin, give the CLI `close_timeout` to exit, then kill it
    ///
    /// # Errors
    /// Returns error if waiting on the process fails
    pub(super) async fn close_impl(&mut self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }

        // The reader holds the process lock while reaping the child
        if let Some(task) = self.reader_task.take() {
            task.abort();
            let _ = task.await;
        }
        self.stdout = None;

        let child = self.process.lock().await.take();
        if let Some(mut child) = child {
            match tokio::time::timeout(self.options.close_timeout, child.wait()).await {
                Ok(Ok(status)) => log::debug!("Claude Code exited with {status}"),
                Ok(Err(e)) => return Err(ClaudeError::Io(e)),
                Err(_) => {
                    log::debug!(
                        "Claude Code still running after {:?}, killing it",
                        self.options.close_timeout
                    );
                    let _ = child.kill().await;
                }
            }
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        Ok(())
    }

    /// Handle Drop cleanup
    pub(super) fn drop_impl(&mut self) {
        self.ready.store(false, Ordering::SeqCst);
        drop(self.stdin.take());

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        // A child still owned by an aborting reader is killed on drop
        if let Ok(mut process) = self.process.try_lock()
            && let Some(mut child) = process.take()
        {
            let _ = child.start_kill();
        }
    }
}

/// Read stderr line by line into the tail, the log and the user callback
async fn capture_stderr(stderr: ChildStderr, tail: Arc<StderrTail>, callback: Option<StderrCallback>) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                log::debug!("claude stderr: {line}");
                if let Some(ref callback) = callback {
                    callback(&line);
                }
                tail.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("Stopped reading claude stderr: {e}");
                break;
            }
        }
    }
    tail.finish();
}
