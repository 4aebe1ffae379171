//! Request/response correlation for outbound control requests

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::error::{ClaudeError, Result};
use crate::types::identifiers::RequestId;

use super::protocol::{ControlRequest, ControlResponse};

/// Request awaiting its response
struct PendingRequest {
    /// Response channel, consumed on resolution
    response_tx: oneshot::Sender<Result<serde_json::Value>>,
    /// Request subtype, for diagnostics
    subtype: &'static str,
    /// When the caller stops waiting
    deadline: Instant,
}

/// Removes a pending entry once its caller stops waiting
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingTable>,
    request_id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.lock().entries.remove(&self.request_id);
    }
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<RequestId, PendingRequest>,
    // Set once the connection is gone; new requests fail immediately with it
    closed: Option<ClaudeError>,
}

/// Correlates outbound control requests with their responses
///
/// Any number of requests may be outstanding. Each one resolves exactly once:
/// with the matching response, with a timeout, or with the cause passed to
/// [`ControlChannel::close_all`]. A caller that stops waiting removes its own
/// entry.
pub struct ControlChannel {
    next_request_id: AtomicU64,
    pending: Mutex<PendingTable>,
    outbound: mpsc::UnboundedSender<serde_json::Value>,
}

impl ControlChannel {
    /// Create a channel writing frames to `outbound`
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<serde_json::Value>) -> Self {
        Self {
            next_request_id: AtomicU64::new(1),
            pending: Mutex::new(PendingTable::default()),
            outbound,
        }
    }

    /// Generate the next request ID
    ///
    /// Ids combine a per-session counter with a random suffix and are never reused.
    #[must_use]
    pub fn next_id(&self) -> RequestId {
        let counter = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        RequestId::new(format!("req_{counter}_{}", &suffix[..8]))
    }

    /// Send a request and wait for its response
    ///
    /// On timeout, or when the returned future is dropped, the pending entry
    /// is discarded; a response arriving later is ignored. The remote side is
    /// not told to cancel.
    ///
    /// # Errors
    /// - [`ClaudeError::Timeout`] if no response arrives within `timeout`
    /// - [`ClaudeError::ControlProtocol`] if the peer answers with an error
    /// - The cause given to [`ControlChannel::close_all`] if the connection ends first
    pub async fn send_request(
        &self,
        request: ControlRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let subtype = request.subtype();
        let request_id = self.next_id();
        let frame = request.to_frame(&request_id)?;
        let deadline = Instant::now() + timeout;
        let (response_tx, response_rx) = oneshot::channel();

        {
            let mut pending = self.pending.lock();
            if let Some(ref cause) = pending.closed {
                return Err(cause.replicate());
            }
            pending.entries.insert(
                request_id.clone(),
                PendingRequest {
                    response_tx,
                    subtype,
                    deadline,
                },
            );
        }
        // Dropping this future at any await below discards the entry
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id: request_id.clone(),
        };

        log::debug!("Sending {subtype} control request {request_id}");
        if self.outbound.send(frame).is_err() {
            return Err(ClaudeError::connection_closed("control writer stopped"));
        }

        match tokio::time::timeout_at(deadline, response_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ClaudeError::connection_closed(format!(
                "{subtype} request {request_id} dropped"
            ))),
            Err(_) => {
                log::warn!("{subtype} control request {request_id} timed out after {timeout:?}");
                Err(ClaudeError::timeout(format!(
                    "{subtype} control request {request_id} timed out after {timeout:?}"
                )))
            }
        }
    }

    /// Route a response to the request waiting for it
    ///
    /// Returns whether a pending request was resolved. Responses for unknown,
    /// timed-out or already answered ids are logged and ignored.
    pub fn handle_response(&self, response: ControlResponse) -> bool {
        let Some(pending) = self.pending.lock().entries.remove(response.request_id()) else {
            log::debug!(
                "Ignoring control response for unknown request {}",
                response.request_id()
            );
            return false;
        };

        let outcome = match response {
            ControlResponse::Success { response, .. } => {
                Ok(response.unwrap_or(serde_json::Value::Null))
            }
            ControlResponse::Error {
                request_id, error, ..
            } => Err(ClaudeError::control_protocol(format!(
                "{} request {request_id} failed: {error}",
                pending.subtype
            ))),
        };

        if Instant::now() > pending.deadline {
            log::debug!("{} response arrived past its deadline", pending.subtype);
        }
        pending.response_tx.send(outcome).is_ok()
    }

    /// Fail every pending request with `cause`
    ///
    /// Each waiter receives its own copy of `cause`, so a process exit reaches
    /// callers with its exit code and stderr intact. Use
    /// [`ClaudeError::ConnectionClosed`] for a clean end of stream or a local
    /// close. Requests sent afterwards fail immediately with the first cause.
    /// Returns how many requests were pending.
    pub fn close_all(&self, cause: ClaudeError) -> usize {
        let (drained, cause): (Vec<_>, _) = {
            let mut pending = self.pending.lock();
            let cause = pending.closed.get_or_insert(cause).replicate();
            (pending.entries.drain().collect(), cause)
        };

        let count = drained.len();
        for (request_id, request) in drained {
            log::debug!("Closing pending {} request {request_id}: {cause}", request.subtype);
            let _ = request.response_tx.send(Err(cause.replicate()));
        }
        count
    }

    /// Answer an inbound control request
    ///
    /// # Errors
    /// Returns error if the response cannot be queued for writing
    pub fn respond(&self, request_id: RequestId, outcome: Result<serde_json::Value>) -> Result<()> {
        let frame = ControlResponse::from_result(request_id, outcome).to_frame()?;
        self.outbound
            .send(frame)
            .map_err(|_| ClaudeError::connection_closed("control writer stopped"))
    }

    /// Number of requests waiting for a response
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().entries.len()
    }

    /// Whether [`ControlChannel::close_all`] has run
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed.is_some()
    }
}
