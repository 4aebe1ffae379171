//! `ClaudeSDKClient` implementation
//!
//! This module contains the constructors and public API methods for `ClaudeSDKClient`.

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use tokio::sync::{Mutex, mpsc};

use crate::control::{ClientCapabilities, ControlChannel, ControlRequest};
use crate::error::{ClaudeError, Result};
use crate::hooks::HookManager;
use crate::mcp::ToolBridge;
use crate::permissions::PermissionManager;
use crate::transport::{SubprocessTransport, Transport, encode_line};
use crate::types::identifiers::SessionId;
use crate::types::messages::{Message, UserContent};
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::PermissionMode;

use super::ClaudeSDKClient;
use super::state::{SessionState, StateCell};
use super::tasks::{ControlRouter, DrainContext, drain_task, writer_task};

impl ClaudeSDKClient<SubprocessTransport> {
    /// Start the Claude Code CLI and connect to it
    ///
    /// # Arguments
    /// * `options` - Configuration options
    /// * `cli_path` - Optional path to Claude Code CLI (searched for if `None`)
    ///
    /// # Errors
    /// - `ClaudeError::CliNotFound` if the CLI cannot be found
    /// - `ClaudeError::InvalidConfig` if the options are invalid
    /// - `ClaudeError::Startup` if the process or the handshake fails
    pub async fn new(
        options: ClaudeAgentOptions,
        cli_path: Option<std::path::PathBuf>,
    ) -> Result<Self> {
        options.validate()?;
        let transport = SubprocessTransport::new(options.clone(), cli_path)?;
        Self::with_transport(options, transport).await
    }
}

impl<T: Transport + 'static> ClaudeSDKClient<T> {
    /// Connect over an already constructed transport
    ///
    /// Connects the transport, starts the background tasks and performs the
    /// `initialize` handshake within `options.initialize_timeout`.
    ///
    /// # Errors
    /// - `ClaudeError::InvalidConfig` if the options are invalid
    /// - `ClaudeError::CliNotFound` if the transport cannot find the CLI
    /// - `ClaudeError::Startup` if connecting or the handshake fails
    pub async fn with_transport(options: ClaudeAgentOptions, mut transport: T) -> Result<Self> {
        options.validate()?;

        let state = Arc::new(StateCell::new());
        state.advance(SessionState::Idle, SessionState::Connecting);

        let router = Arc::new(Self::build_router(&options)?);
        log::debug!(
            "Client capabilities: {}",
            router.capabilities.names().join(", ")
        );

        if let Err(e) = transport.connect().await {
            state.close();
            return Err(match e {
                ClaudeError::CliNotFound(_) => e,
                other => ClaudeError::startup(format!("Failed to connect: {other}")),
            });
        }

        let frames = transport.read_messages();
        let transport = Arc::new(Mutex::new(transport));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let channel = Arc::new(ControlChannel::new(outbound_tx));
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let session_id = Arc::new(parking_lot::Mutex::new(None));

        let writer = tokio::spawn(writer_task(Arc::clone(&transport), outbound_rx));
        let reader = tokio::spawn(drain_task(
            frames,
            DrainContext {
                channel: Arc::clone(&channel),
                router: Arc::clone(&router),
                message_tx,
                state: Arc::clone(&state),
                session_id: Arc::clone(&session_id),
            },
        ));

        let mut client = Self {
            transport,
            channel,
            state,
            message_rx,
            session_id,
            server_info: None,
            capabilities: router.capabilities,
            control_timeout: options.control_timeout,
            reader_task: parking_lot::Mutex::new(Some(reader)),
            writer_task: parking_lot::Mutex::new(Some(writer)),
        };

        let initialize = ControlRequest::Initialize {
            hooks: router.hooks.initialize_config(),
        };
        match client
            .channel
            .send_request(initialize, options.initialize_timeout)
            .await
        {
            Ok(info) => {
                if !client
                    .state
                    .advance(SessionState::Connecting, SessionState::Connected)
                {
                    let _ = client.close().await;
                    return Err(ClaudeError::startup(
                        "Connection closed during initialize handshake",
                    ));
                }
                log::debug!("Session initialized");
                client.server_info = Some(info);
                Ok(client)
            }
            Err(e) => {
                let _ = client.close().await;
                Err(ClaudeError::startup(format!("Initialize handshake failed: {e}")))
            }
        }
    }

    fn build_router(options: &ClaudeAgentOptions) -> Result<ControlRouter> {
        let hooks = options
            .hooks
            .as_ref()
            .map(HookManager::from_config)
            .unwrap_or_default();

        let mut permissions = PermissionManager::builder().disallowed_tools(options.disallowed_tools.clone());
        if let Some(ref callback) = options.can_use_tool {
            permissions = permissions.callback(Arc::clone(callback));
        }
        let permissions = permissions.build();

        let bridge = ToolBridge::from_servers(&options.mcp_servers)?;

        let mut capabilities = ClientCapabilities::INTERRUPTS;
        capabilities.set(ClientCapabilities::HOOKS, !hooks.is_empty());
        capabilities.set(ClientCapabilities::PERMISSIONS, permissions.has_callback());
        capabilities.set(ClientCapabilities::SDK_MCP, !bridge.is_empty());

        Ok(ControlRouter {
            hooks,
            permissions,
            bridge,
            capabilities,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state.get() {
            state if state.is_open() => Ok(()),
            SessionState::Closed => Err(ClaudeError::connection_closed("session is closed")),
            state => Err(ClaudeError::connection(format!("session is {state}"))),
        }
    }

    /// Send a user message
    ///
    /// Accepts plain text or content blocks.
    ///
    /// # Errors
    /// Returns error if the session is not connected or the write fails
    pub async fn send_message(&self, content: impl Into<UserContent>) -> Result<()> {
        self.ensure_open()?;

        let session_id = self
            .session_id
            .lock()
            .clone()
            .unwrap_or_default();
        let frame = serde_json::json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": content.into(),
            },
            "parent_tool_use_id": null,
            "session_id": session_id,
        });
        let line = encode_line(&frame)?;

        let mut transport = self.transport.lock().await;
        transport.write(&line).await
    }

    /// Get the next message from the stream
    ///
    /// Returns `None` once the session has ended. A fatal error is delivered
    /// as the final item.
    pub async fn next_message(&mut self) -> Option<Result<Message>> {
        self.message_rx.recv().await
    }

    /// Stream every message until the session ends
    pub fn receive_messages(&mut self) -> impl Stream<Item = Result<Message>> + '_ {
        async_stream::stream! {
            while let Some(message) = self.message_rx.recv().await {
                yield message;
            }
        }
    }

    /// Stream messages up to and including the next `Result` message
    pub fn receive_response(&mut self) -> impl Stream<Item = Result<Message>> + '_ {
        async_stream::stream! {
            while let Some(message) = self.message_rx.recv().await {
                let done = match message {
                    Ok(ref message) => message.is_result(),
                    Err(_) => true,
                };
                yield message;
                if done {
                    break;
                }
            }
        }
    }

    /// Interrupt the current turn
    ///
    /// The session returns to `Connected` once the request finishes in any
    /// way, including when the caller drops this future before it completes.
    ///
    /// # Errors
    /// Returns error if the session is not connected, an interrupt is already
    /// in flight, or the CLI reports a failure
    pub async fn interrupt(&self) -> Result<()> {
        if !self
            .state
            .advance(SessionState::Connected, SessionState::Interrupting)
        {
            return match self.state.get() {
                SessionState::Interrupting => Err(ClaudeError::control_protocol(
                    "An interrupt is already in progress",
                )),
                _ => self.ensure_open(),
            };
        }

        let _guard = InterruptGuard(&self.state);
        self.channel
            .send_request(ControlRequest::Interrupt, self.control_timeout)
            .await
            .map(|_| ())
    }

    /// Change the permission mode for the rest of the session
    ///
    /// # Errors
    /// Returns error if the session is not connected or the CLI refuses
    pub async fn set_permission_mode(&self, mode: PermissionMode) -> Result<()> {
        self.ensure_open()?;
        self.channel
            .send_request(ControlRequest::SetPermissionMode { mode }, self.control_timeout)
            .await
            .map(|_| ())
    }

    /// Change the model; `None` restores the default
    ///
    /// # Errors
    /// Returns error if the session is not connected or the CLI refuses
    pub async fn set_model(&self, model: Option<String>) -> Result<()> {
        self.ensure_open()?;
        self.channel
            .send_request(ControlRequest::SetModel { model }, self.control_timeout)
            .await
            .map(|_| ())
    }

    /// Override the timeout used for subsequent control requests
    pub const fn set_control_timeout(&mut self, timeout: Duration) {
        self.control_timeout = timeout;
    }

    /// Session id reported by the CLI, once a message has carried one
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id.lock().clone()
    }

    /// The CLI's reply to the `initialize` handshake
    #[must_use]
    pub const fn server_info(&self) -> Option<&serde_json::Value> {
        self.server_info.as_ref()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Inbound request kinds this client answers
    #[must_use]
    pub const fn capabilities(&self) -> ClientCapabilities {
        self.capabilities
    }

    /// Number of outbound control requests awaiting a response
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.channel.pending_count()
    }

    /// Close the session
    ///
    /// Stdin is closed, the transport is shut down and every pending control
    /// request fails with `ClaudeError::ConnectionClosed`. Messages already
    /// received remain readable. `close` may run while other calls on this
    /// client are still waiting; calling it again is a no-op.
    ///
    /// # Errors
    /// Returns error if transport cleanup fails
    pub async fn close(&self) -> Result<()> {
        self.state.close();
        self.channel
            .close_all(ClaudeError::connection_closed("client closed"));

        let outcome = {
            let mut transport = self.transport.lock().await;
            transport.close().await
        };

        let writer = self.writer_task.lock().take();
        if let Some(task) = writer {
            task.abort();
        }
        let reader = self.reader_task.lock().take();
        if let Some(task) = reader {
            // Let the drain task deliver what the transport already produced
            if tokio::time::timeout(Duration::from_millis(100), task).await.is_err() {
                log::debug!("Drain task still running after close");
            }
        }

        outcome
    }
}

/// Returns the session from `Interrupting` to `Connected` when dropped
struct InterruptGuard<'a>(&'a StateCell);

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        // No-op once the session has closed
        self.0
            .advance(SessionState::Interrupting, SessionState::Connected);
    }
}

impl<T: Transport + 'static> Drop for ClaudeSDKClient<T> {
    fn drop(&mut self) {
        self.state.close();
        self.channel
            .close_all(ClaudeError::connection_closed("client dropped"));
        if let Some(task) = self.writer_task.get_mut().take() {
            task.abort();
        }
        if let Some(task) = self.reader_task.get_mut().take() {
            task.abort();
        }
    }
}
