//! Line framing for the stream-json protocol
//!
//! Every frame is one JSON value terminated by `\n`. Reads may split a frame
//! across chunks or deliver several frames in one chunk; [`JsonLinesCodec`]
//! reassembles them.

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, FramedRead};

use crate::error::{ClaudeError, Result};

/// Default maximum size of a single frame (1MB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Serialize a value as a single protocol line, including the terminator
///
/// # Errors
/// Returns error if the value cannot be serialized
pub fn encode_line(value: &serde_json::Value) -> Result<String> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

/// Decoder turning a byte stream into JSON values, one per line
#[derive(Debug, Clone)]
pub struct JsonLinesCodec {
    max_length: usize,
    // Bytes already scanned for a terminator in the current buffer
    next_index: usize,
}

impl JsonLinesCodec {
    /// Create a codec with the default frame size limit
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Create a codec that rejects frames longer than `max_length` bytes
    #[must_use]
    pub const fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    /// Maximum accepted frame length in bytes
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    fn parse_line(line: &[u8]) -> Result<Option<serde_json::Value>> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(line).map(Some).map_err(|e| {
            ClaudeError::frame_decode(
                format!("invalid JSON line: {e}"),
                String::from_utf8_lossy(line).into_owned(),
            )
        })
    }
}

impl Default for JsonLinesCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonLinesCodec {
    type Item = serde_json::Value;
    type Error = ClaudeError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let scan_from = self.next_index.min(buf.len());
            let Some(offset) = buf[scan_from..].iter().position(|b| *b == b'\n') else {
                if buf.len() > self.max_length {
                    return Err(ClaudeError::frame_decode(
                        format!(
                            "frame exceeded maximum buffer size of {} bytes",
                            self.max_length
                        ),
                        String::from_utf8_lossy(&buf[..self.max_length.min(256)]).into_owned(),
                    ));
                }
                self.next_index = buf.len();
                return Ok(None);
            };

            let line = buf.split_to(scan_from + offset + 1);
            self.next_index = 0;

            if line.len() - 1 > self.max_length {
                return Err(ClaudeError::frame_decode(
                    format!(
                        "frame of {} bytes exceeded maximum buffer size of {} bytes",
                        line.len() - 1,
                        self.max_length
                    ),
                    String::from_utf8_lossy(&line[..self.max_length.min(256)]).into_owned(),
                ));
            }

            if let Some(value) = Self::parse_line(&line[..line.len() - 1])? {
                return Ok(Some(value));
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(value) = self.decode(buf)? {
            return Ok(Some(value));
        }
        if buf.is_empty() {
            return Ok(None);
        }

        // Final line without a terminator
        let rest = buf.split_to(buf.len());
        self.next_index = 0;
        Self::parse_line(&rest)
    }
}

/// How a frame forwarding loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameEnd {
    /// The reader reached end of stream
    Eof,
    /// A framing or I/O error was forwarded and reading stopped
    Failed,
    /// Nobody is listening any more
    ReceiverDropped,
}

/// Decode frames from `reader` and forward them until the stream ends
pub(crate) async fn forward_frames<R>(
    reader: R,
    max_buffer_size: usize,
    tx: &mpsc::UnboundedSender<Result<serde_json::Value>>,
) -> FrameEnd
where
    R: AsyncRead + Unpin,
{
    let mut frames = FramedRead::new(reader, JsonLinesCodec::with_max_length(max_buffer_size));

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(value) => {
                if tx.send(Ok(value)).is_err() {
                    return FrameEnd::ReceiverDropped;
                }
            }
            Err(e) => {
                log::debug!("Frame reader stopping: {e}");
                let _ = tx.send(Err(e));
                return FrameEnd::Failed;
            }
        }
    }

    FrameEnd::Eof
}
