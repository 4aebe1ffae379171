//! In-memory stand-in for the Claude Code CLI
//!
//! Included by the integration tests through `#[path]`. The client side gets
//! a [`StreamTransport`] over a pair of duplex pipes, the test drives the
//! other end line by line.

#![allow(dead_code)]

use std::time::Duration;

use kodegen_claude_runtime::StreamTransport;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

pub type FakeTransport = StreamTransport<DuplexStream, DuplexStream>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FakeCli {
    lines: Lines<BufReader<DuplexStream>>,
    writer: Option<DuplexStream>,
}

/// Create a connected transport and the fake CLI driving its other end
pub fn pair() -> (FakeTransport, FakeCli) {
    let _ = env_logger::builder().is_test(true).try_init();

    let (client_read, cli_write) = tokio::io::duplex(64 * 1024);
    let (cli_read, client_write) = tokio::io::duplex(64 * 1024);

    (
        StreamTransport::new(client_read, client_write),
        FakeCli {
            lines: BufReader::new(cli_read).lines(),
            writer: Some(cli_write),
        },
    )
}

impl FakeCli {
    /// Next frame the client wrote
    pub async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for a frame from the client")
            .expect("read from client failed")
            .expect("client closed its output");
        serde_json::from_str(&line).expect("client wrote invalid JSON")
    }

    /// Next frame, or `None` once the client has closed its output
    pub async fn try_recv(&mut self) -> Option<Value> {
        let line = tokio::time::timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("timed out waiting for the client")
            .ok()??;
        Some(serde_json::from_str(&line).expect("client wrote invalid JSON"))
    }

    /// Write one frame to the client
    pub async fn send(&mut self, frame: Value) {
        let mut line = serde_json::to_string(&frame).expect("frame serializes");
        line.push('\n');
        self.send_raw(&line).await;
    }

    /// Write raw bytes to the client
    pub async fn send_raw(&mut self, data: &str) {
        let writer = self.writer.as_mut().expect("fake CLI output already closed");
        writer.write_all(data.as_bytes()).await.expect("write to client failed");
        writer.flush().await.expect("flush to client failed");
    }

    /// Answer a request the client sent
    pub async fn reply(&mut self, request: &Value, response: Value) {
        self.send(json!({
            "type": "control_response",
            "response": {
                "subtype": "success",
                "request_id": request["request_id"],
                "response": response,
            }
        }))
        .await;
    }

    /// Refuse a request the client sent
    pub async fn reply_error(&mut self, request: &Value, error: &str) {
        self.send(json!({
            "type": "control_response",
            "response": {
                "subtype": "error",
                "request_id": request["request_id"],
                "error": error,
            }
        }))
        .await;
    }

    /// Answer the `initialize` request and return it
    pub async fn handshake(&mut self) -> Value {
        let request = self.recv().await;
        assert_eq!(request["type"], "control_request");
        assert_eq!(request["request"]["subtype"], "initialize");
        self.reply(&request, json!({"commands": [], "output_style": "default"}))
            .await;
        request
    }

    /// Send a control request to the client and return the response body
    pub async fn request(&mut self, request_id: &str, request: Value) -> Value {
        self.send(json!({
            "type": "control_request",
            "request_id": request_id,
            "request": request,
        }))
        .await;

        loop {
            let frame = self.recv().await;
            if frame["type"] == "control_response"
                && frame["response"]["request_id"] == request_id
            {
                return frame["response"].clone();
            }
        }
    }

    /// End the CLI's output stream
    pub fn close_output(&mut self) {
        self.writer = None;
    }
}

pub fn assistant_text(text: &str) -> Value {
    json!({
        "type": "assistant",
        "message": {
            "model": "claude-sonnet-4-5",
            "content": [{"type": "text", "text": text}]
        },
        "session_id": "sess-1"
    })
}

pub fn result_message() -> Value {
    json!({
        "type": "result",
        "subtype": "success",
        "duration_ms": 1200,
        "duration_api_ms": 900,
        "is_error": false,
        "num_turns": 1,
        "session_id": "sess-1",
        "total_cost_usd": 0.0012,
        "result": "done"
    })
}
