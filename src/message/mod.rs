//! Message decoding
//!
//! Turns raw frames from the transport into typed conversation messages or
//! control protocol frames.

mod parser;

pub use parser::{InboundFrame, classify_frame, parse_message};
