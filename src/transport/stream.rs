//! Transport over an arbitrary pair of async byte streams
//!
//! Useful when the CLI is reached through something other than a child
//! process (a socket, a pipe handed over by a supervisor) and for driving a
//! session against an in-memory peer built from [`tokio::io::duplex`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::Transport;
use crate::error::{ClaudeError, Result};

use super::framing::{DEFAULT_MAX_BUFFER_SIZE, forward_frames};

/// Transport reading frames from `R` and writing frames to `W`
pub struct StreamTransport<R, W> {
    reader: Option<R>,
    writer: Option<W>,
    ready: Arc<AtomicBool>,
    max_buffer_size: usize,
    reader_task: Option<JoinHandle<()>>,
}

impl<R, W> StreamTransport<R, W> {
    /// Create a transport over the given read and write halves
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            ready: Arc::new(AtomicBool::new(false)),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            reader_task: None,
        }
    }

    /// Override the maximum frame size
    #[must_use]
    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }
}

impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Send + Sync + Unpin + 'static,
    W: AsyncWrite + Send + Sync + Unpin + 'static,
{
    async fn connect(&mut self) -> Result<()> {
        if self.writer.is_none() {
            return Err(ClaudeError::connection("stream transport already closed"));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(ClaudeError::transport("Transport is not ready for writing"));
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ClaudeError::transport("writer not available"))?;

        writer
            .write_all(data.as_bytes())
            .await
            .map_err(|e| ClaudeError::transport(format!("Failed to write frame: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| ClaudeError::transport(format!("Failed to flush frame: {e}")))?;

        Ok(())
    }

    async fn end_input(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .shutdown()
                .await
                .map_err(|e| ClaudeError::transport(format!("Failed to close writer: {e}")))?;
        }
        Ok(())
    }

    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = self.reader.take();
        let max_buffer_size = self.max_buffer_size;

        let task = tokio::spawn(async move {
            let Some(reader) = reader else {
                let _ = tx.send(Err(ClaudeError::connection(
                    "Not connected - reader not available",
                )));
                return;
            };
            let end = forward_frames(reader, max_buffer_size, &tx).await;
            log::debug!("Stream transport reader finished: {end:?}");
        });

        self.reader_task = Some(task);
        rx
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);
        let shutdown = self.end_input().await;
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        self.reader = None;
        shutdown
    }
}

impl<R, W> Drop for StreamTransport<R, W> {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
