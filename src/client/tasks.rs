//! Background tasks for `ClaudeSDKClient`
//!
//! The drain task owns the inbound frame receiver and routes every frame;
//! the writer task owns the outbound frame queue. Each inbound control
//! request gets its own short-lived task so a slow hook only delays its
//! own reply.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Mutex, mpsc};

use crate::control::{ClientCapabilities, ControlChannel, ControlRequest};
use crate::error::{ClaudeError, Result};
use crate::hooks::HookManager;
use crate::mcp::ToolBridge;
use crate::message::{InboundFrame, classify_frame};
use crate::permissions::PermissionManager;
use crate::transport::{Transport, encode_line};
use crate::types::identifiers::SessionId;
use crate::types::messages::Message;

use super::state::StateCell;

/// Answers control requests sent by the CLI
pub(crate) struct ControlRouter {
    pub(crate) hooks: HookManager,
    pub(crate) permissions: PermissionManager,
    pub(crate) bridge: ToolBridge,
    pub(crate) capabilities: ClientCapabilities,
}

impl ControlRouter {
    /// Produce the response payload for an inbound request
    pub(crate) async fn handle(&self, request: ControlRequest) -> Result<serde_json::Value> {
        let subtype = request.subtype();
        if let Some(required) = ClientCapabilities::required_for(subtype)
            && !self.capabilities.contains(required)
        {
            return Err(ClaudeError::control_protocol(format!(
                "{subtype} is not supported: no handler is configured"
            )));
        }

        match request {
            ControlRequest::CanUseTool {
                tool_name,
                input,
                permission_suggestions,
                blocked_path,
            } => {
                self.permissions
                    .handle_request(tool_name, input, permission_suggestions, blocked_path)
                    .await
            }
            ControlRequest::HookCallback {
                callback_id,
                input,
                tool_use_id,
            } => {
                let output = self
                    .hooks
                    .handle_callback(callback_id.as_deref(), input, tool_use_id)
                    .await?;
                Ok(serde_json::to_value(output)?)
            }
            ControlRequest::McpMessage {
                server_name,
                message,
            } => self.bridge.handle_mcp_message(&server_name, message).await,
            other => Err(ClaudeError::control_protocol(format!(
                "Unexpected inbound {} request",
                other.subtype()
            ))),
        }
    }
}

/// Everything the drain task routes frames to
pub(crate) struct DrainContext {
    pub(crate) channel: Arc<ControlChannel>,
    pub(crate) router: Arc<ControlRouter>,
    pub(crate) message_tx: mpsc::UnboundedSender<Result<Message>>,
    pub(crate) state: Arc<StateCell>,
    pub(crate) session_id: Arc<parking_lot::Mutex<Option<SessionId>>>,
}

/// Route inbound frames until the stream ends or fails
///
/// On exit every pending request is failed, the session is closed and a
/// terminal error, if any, is delivered as the last message.
pub(crate) async fn drain_task(
    mut frames: mpsc::UnboundedReceiver<Result<serde_json::Value>>,
    ctx: DrainContext,
) {
    let terminal = loop {
        let frame = match frames.recv().await {
            None => break None,
            Some(Err(e)) => break Some(e),
            Some(Ok(frame)) => frame,
        };

        match classify_frame(frame) {
            Err(e) => break Some(e),
            Ok(InboundFrame::Message(message)) => {
                if let Some(id) = message.session_id() {
                    let mut session_id = ctx.session_id.lock();
                    if session_id.as_ref().is_none_or(|current| current.as_str() != id) {
                        log::debug!("Session id is now {id}");
                        *session_id = Some(SessionId::new(id));
                    }
                }
                if ctx.message_tx.send(Ok(message)).is_err() {
                    log::trace!("Message receiver dropped; still serving control traffic");
                }
            }
            Ok(InboundFrame::ControlResponse(response)) => {
                ctx.channel.handle_response(response);
            }
            Ok(InboundFrame::ControlRequest {
                request_id,
                request,
            }) => {
                log::debug!("Received {} control request {request_id}", request.subtype());
                let channel = Arc::clone(&ctx.channel);
                let router = Arc::clone(&ctx.router);
                tokio::spawn(async move {
                    let outcome = match AssertUnwindSafe(router.handle(request))
                        .catch_unwind()
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            log::error!("Handler for control request {request_id} panicked");
                            Err(ClaudeError::control_protocol("control request handler panicked"))
                        }
                    };
                    if let Err(ref e) = outcome {
                        log::debug!("Control request {request_id} failed: {e}");
                    }
                    if let Err(e) = channel.respond(request_id, outcome) {
                        log::warn!("Could not answer control request: {e}");
                    }
                });
            }
            Ok(InboundFrame::UnsupportedControlRequest { request_id, reason }) => {
                log::warn!("Rejecting control request {request_id}: {reason}");
                if let Err(e) = ctx
                    .channel
                    .respond(request_id, Err(ClaudeError::control_protocol(reason)))
                {
                    log::warn!("Could not answer control request: {e}");
                }
            }
            Ok(InboundFrame::ControlCancel { request_id }) => {
                log::debug!("CLI cancelled control request {request_id}");
            }
        }
    };

    let cause = terminal.as_ref().map_or_else(
        || ClaudeError::connection_closed("stream ended"),
        ClaudeError::replicate,
    );
    let failed = ctx.channel.close_all(cause);
    if failed > 0 {
        log::debug!("Failed {failed} pending control request(s)");
    }
    ctx.state.close();

    if let Some(e) = terminal {
        log::debug!("Session ended with error: {e}");
        let _ = ctx.message_tx.send(Err(e));
    }
}

/// Write queued frames to the transport, one line each
pub(crate) async fn writer_task<T: Transport>(
    transport: Arc<Mutex<T>>,
    mut outbound: mpsc::UnboundedReceiver<serde_json::Value>,
) {
    while let Some(frame) = outbound.recv().await {
        let line = match encode_line(&frame) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Dropping unencodable control frame: {e}");
                continue;
            }
        };

        let mut transport = transport.lock().await;
        if let Err(e) = transport.write(&line).await {
            log::error!("Control writer stopping: {e}");
            break;
        }
    }
}
