//! `ClaudeSDKClient` for bidirectional communication
//!
//! This module provides the main client for interactive, stateful conversations
//! with Claude Code, including support for:
//! - Streaming conversation output while control traffic flows both ways
//! - Interrupts, permission mode and model changes
//! - Hook, permission and in-process tool callbacks
//! - Session lifecycle tracking
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      ClaudeSDKClient                      │
//! │                                                           │
//! │  ┌────────────────────┐           ┌──────────────────┐    │
//! │  │    Drain Task      │           │   Writer Task    │    │
//! │  │                    │  replies  │                  │    │
//! │  │ • messages → caller├──────────→│ • one line per   │    │
//! │  │ • responses →      │           │   frame          │    │
//! │  │   ControlChannel   │           │ • locks per write│    │
//! │  │ • requests → hooks,│           │                  │    │
//! │  │   permissions, MCP │           │                  │    │
//! │  └─────────┬──────────┘           └────────┬─────────┘    │
//! │            │        ┌──────────────┐       │              │
//! │            └───────→│  Transport   │←──────┘              │
//! │                     │ (Arc<Mutex>) │                      │
//! │                     └──────────────┘                      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! - The transport hands out an owned receiver once; the drain task never
//!   holds the transport lock
//! - Outbound control requests await their own response id, so the output
//!   stream keeps flowing while they are in flight
//! - Each inbound control request is answered from its own task
//!
//! # Example: Basic Usage
//!
//! ```no_run
//! use kodegen_claude_runtime::{ClaudeSDKClient, ClaudeAgentOptions, Message};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClaudeAgentOptions::default();
//! let mut client = ClaudeSDKClient::new(options, None).await?;
//!
//! client.send_message("Hello, Claude!").await?;
//!
//! while let Some(message) = client.next_message().await {
//!     match message? {
//!         Message::Assistant { message, .. } => {
//!             log::info!("Response: {:?}", message.content);
//!         }
//!         Message::Result { .. } => break,
//!         _ => {}
//!     }
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Interrupt
//!
//! ```no_run
//! use kodegen_claude_runtime::{ClaudeSDKClient, ClaudeAgentOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeSDKClient::new(ClaudeAgentOptions::default(), None).await?;
//!
//! client.send_message("Write a long essay").await?;
//! tokio::time::sleep(std::time::Duration::from_millis(500)).await;
//! client.interrupt().await?;
//! # Ok(())
//! # }
//! ```

mod client_impl;
mod state;
mod tasks;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::control::{ClientCapabilities, ControlChannel};
use crate::error::Result;
use crate::transport::{SubprocessTransport, Transport};
use crate::types::identifiers::SessionId;
use crate::types::messages::Message;

pub use state::SessionState;
use state::StateCell;

/// Client for bidirectional communication with Claude Code
///
/// One client drives exactly one CLI process. Once closed, a session cannot
/// be reopened; create a new client instead.
pub struct ClaudeSDKClient<T: Transport + 'static = SubprocessTransport> {
    /// Transport layer, shared with the writer task
    transport: Arc<Mutex<T>>,
    /// Outbound control request correlation
    channel: Arc<ControlChannel>,
    /// Lifecycle state, shared with the drain task
    state: Arc<StateCell>,
    /// Conversation output
    message_rx: mpsc::UnboundedReceiver<Result<Message>>,
    /// Latest session id seen on the stream
    session_id: Arc<parking_lot::Mutex<Option<SessionId>>>,
    /// Reply to `initialize`
    server_info: Option<serde_json::Value>,
    capabilities: ClientCapabilities,
    control_timeout: Duration,
    /// Background tasks, taken by whichever of `close` or `Drop` runs first
    reader_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    writer_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}
