//! Message reading logic for subprocess transport

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{ClaudeError, Result};
use crate::transport::framing::{FrameEnd, forward_frames};

use super::transport::SubprocessTransport;

/// How long to wait for trailing stderr output once stdout has closed
const STDERR_DRAIN_LIMIT: Duration = Duration::from_millis(500);

impl SubprocessTransport {
    /// Read frames from the subprocess output
    ///
    /// After a clean end of stream the child is reaped; a non-zero exit is
    /// reported as `ClaudeError::Process` carrying the stderr tail.
    pub(super) fn read_messages_impl(
        &mut self,
    ) -> mpsc::UnboundedReceiver<Result<serde_json::Value>> {
        let (tx, rx) = mpsc::unbounded_channel();

        let stdout = self.stdout.take();
        let process = Arc::clone(&self.process);
        let stderr_tail = Arc::clone(&self.stderr_tail);
        let max_buffer_size = self.max_buffer_size;

        let task = tokio::spawn(async move {
            let Some(stdout) = stdout else {
                let _ = tx.send(Err(ClaudeError::connection(
                    "Not connected - stdout not available",
                )));
                return;
            };

            match forward_frames(stdout, max_buffer_size, &tx).await {
                FrameEnd::Eof => {}
                FrameEnd::Failed | FrameEnd::ReceiverDropped => return,
            }

            let mut process = process.lock().await;
            let Some(child) = process.as_mut() else {
                return;
            };
            match child.wait().await {
                Ok(status) if status.success() => {
                    log::debug!("Claude Code exited cleanly");
                }
                Ok(status) => {
                    stderr_tail.wait_finished(STDERR_DRAIN_LIMIT).await;
                    let code = status.code().unwrap_or(-1);
                    let _ = tx.send(Err(ClaudeError::process(
                        format!("Claude Code exited with status {status}"),
                        code,
                        stderr_tail.snapshot(),
                    )));
                }
                Err(e) => {
                    let _ = tx.send(Err(ClaudeError::Io(e)));
                }
            }
        });

        self.reader_task = Some(task);

        rx
    }
}
