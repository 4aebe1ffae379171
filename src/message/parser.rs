//! Decoding of frames received from the CLI

use crate::control::protocol::{ControlRequest, ControlResponse};
use crate::error::{ClaudeError, Result};
use crate::types::identifiers::RequestId;
use crate::types::messages::Message;

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Conversation output for the caller
    Message(Message),
    /// Control request the client must answer
    ControlRequest {
        /// Correlation id to echo in the response
        request_id: RequestId,
        /// Request body
        request: ControlRequest,
    },
    /// Control request with a subtype or shape this client does not understand
    UnsupportedControlRequest {
        /// Correlation id to echo in the error response
        request_id: RequestId,
        /// Why it could not be decoded
        reason: String,
    },
    /// Response to one of our control requests
    ControlResponse(ControlResponse),
    /// CLI withdrew a control request it sent earlier
    ControlCancel {
        /// Id of the withdrawn request
        request_id: RequestId,
    },
}

/// Parse a JSON value into a typed Message
///
/// # Arguments
/// * `data` - Raw JSON value from CLI output
///
/// # Errors
/// Returns `ClaudeError::MessageParse` if the value has no `type`
/// discriminant, an unknown one, or is missing a required field
pub fn parse_message(data: serde_json::Value) -> Result<Message> {
    if data.get("type").and_then(serde_json::Value::as_str).is_none() {
        return Err(ClaudeError::message_parse(
            "Message has no \"type\" discriminant",
            Some(data),
        ));
    }

    serde_json::from_value(data.clone()).map_err(|e| {
        ClaudeError::message_parse(format!("Failed to parse message: {e}"), Some(data))
    })
}

/// Classify a frame as a message, control request, or control response
///
/// Control requests are read from the nested `request` object; a flat layout
/// with the subtype at the top level is accepted as well.
///
/// # Errors
/// Returns `ClaudeError::MessageParse` if the frame cannot be classified
pub fn classify_frame(frame: serde_json::Value) -> Result<InboundFrame> {
    match frame.get("type").and_then(serde_json::Value::as_str) {
        Some("control_request") => parse_control_request(frame),
        Some("control_response") => parse_control_response(frame),
        Some("control_cancel_request") => Ok(InboundFrame::ControlCancel {
            request_id: request_id_of(&frame)?,
        }),
        _ => parse_message(frame).map(InboundFrame::Message),
    }
}

fn request_id_of(frame: &serde_json::Value) -> Result<RequestId> {
    frame
        .get("request_id")
        .and_then(serde_json::Value::as_str)
        .map(RequestId::from)
        .ok_or_else(|| {
            ClaudeError::message_parse("Control frame has no request_id", Some(frame.clone()))
        })
}

fn parse_control_request(frame: serde_json::Value) -> Result<InboundFrame> {
    let request_id = request_id_of(&frame)?;
    let body = match frame.get("request") {
        Some(body @ serde_json::Value::Object(_)) => body.clone(),
        _ => frame,
    };

    Ok(match serde_json::from_value::<ControlRequest>(body) {
        Ok(request) => InboundFrame::ControlRequest {
            request_id,
            request,
        },
        Err(e) => InboundFrame::UnsupportedControlRequest {
            request_id,
            reason: format!("Unsupported control request: {e}"),
        },
    })
}

fn parse_control_response(frame: serde_json::Value) -> Result<InboundFrame> {
    let body = match frame.get("response") {
        Some(body @ serde_json::Value::Object(_)) => body.clone(),
        _ => frame.clone(),
    };

    serde_json::from_value(body)
        .map(InboundFrame::ControlResponse)
        .map_err(|e| {
            ClaudeError::message_parse(format!("Invalid control response: {e}"), Some(frame))
        })
}
