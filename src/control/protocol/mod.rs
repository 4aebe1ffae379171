//! Control protocol wire types
//!
//! Control requests travel in both directions over the same stream as the
//! conversation output:
//!
//! ```text
//! {"type":"control_request","request_id":"req_1_9f2c01ab","request":{"subtype":"interrupt"}}
//! {"type":"control_response","response":{"subtype":"success","request_id":"req_1_9f2c01ab"}}
//! ```
//!
//! # Example: Building Frames
//!
//! ```rust
//! use kodegen_claude_runtime::control::{ControlRequest, ControlResponse};
//! use kodegen_claude_runtime::types::RequestId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let id = RequestId::new("req_1_9f2c01ab");
//! let frame = ControlRequest::Interrupt.to_frame(&id)?;
//! assert_eq!(frame["request"]["subtype"], "interrupt");
//!
//! let reply = ControlResponse::Success { request_id: id, response: None };
//! assert_eq!(reply.to_frame()?["type"], "control_response");
//! # Ok(())
//! # }
//! ```

mod capabilities;
mod messages;

pub use capabilities::ClientCapabilities;
pub use messages::{ControlRequest, ControlResponse};
