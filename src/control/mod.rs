//! Control channel between the client and the CLI
//!
//! - [`protocol`] - wire types for control requests and responses
//! - [`channel`] - correlation of outbound requests with their responses

pub mod channel;
pub mod protocol;

pub use channel::ControlChannel;
pub use protocol::{ClientCapabilities, ControlRequest, ControlResponse};
