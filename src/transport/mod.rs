//! Transport layer for communicating with Claude Code CLI
//!
//! This module provides the transport abstraction, the line framing shared by
//! all transports, and two implementations: a subprocess transport that
//! spawns the CLI, and a stream transport over any async byte pipe.

pub mod framing;
pub mod stream;
pub mod subprocess;

use tokio::sync::mpsc;

use crate::error::Result;

/// Transport trait for communicating with Claude Code
///
/// This trait defines the interface for sending and receiving frames
/// to/from the Claude Code CLI process.
pub trait Transport: Send + Sync {
    /// Connect to the transport
    ///
    /// # Errors
    /// Returns error if connection fails
    fn connect(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Write one encoded line to the transport
    ///
    /// # Arguments
    /// * `data` - A complete frame, terminator included (see [`framing::encode_line`])
    ///
    /// # Errors
    /// Returns error if write fails or transport is not ready
    fn write(&mut self, data: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// End the input stream (close stdin)
    ///
    /// # Errors
    /// Returns error if closing fails
    fn end_input(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Read frames from the transport
    ///
    /// Returns a receiver that yields decoded JSON values in arrival order.
    /// This method spawns a background task to read, allowing concurrent writes.
    /// The receiver yields at most one error, after which it is closed; it is
    /// closed without an error on a clean end of stream.
    fn read_messages(&mut self) -> mpsc::UnboundedReceiver<Result<serde_json::Value>>;

    /// Check if transport is ready for communication
    fn is_ready(&self) -> bool;

    /// Close the transport and clean up resources
    ///
    /// # Errors
    /// Returns error if cleanup fails
    fn close(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub use framing::{DEFAULT_MAX_BUFFER_SIZE, JsonLinesCodec, encode_line};
pub use stream::StreamTransport;
pub use subprocess::SubprocessTransport;
