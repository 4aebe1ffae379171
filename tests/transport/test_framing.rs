//! Tests for line framing over split and coalesced reads

use futures::StreamExt;
use kodegen_claude_runtime::transport::StreamTransport;
use kodegen_claude_runtime::{ClaudeError, JsonLinesCodec, Transport, encode_line};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::codec::FramedRead;

#[tokio::test]
async fn test_frames_split_across_reads() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\"assis")
        .read(b"tant\",\"n\":1}\n{\"type\":")
        .read(b"\"result\"}\n")
        .build();
    let mut frames = FramedRead::new(reader, JsonLinesCodec::new());

    assert_eq!(
        frames.next().await.unwrap().unwrap(),
        json!({"type": "assistant", "n": 1})
    );
    assert_eq!(frames.next().await.unwrap().unwrap(), json!({"type": "result"}));
    assert!(frames.next().await.is_none());
}

#[tokio::test]
async fn test_blank_lines_and_final_unterminated_frame() {
    let reader = tokio_test::io::Builder::new()
        .read(b"\n\r\n{\"a\":1}\n\n")
        .read(b"{\"b\":2}")
        .build();
    let mut frames = FramedRead::new(reader, JsonLinesCodec::new());

    assert_eq!(frames.next().await.unwrap().unwrap(), json!({"a": 1}));
    assert_eq!(frames.next().await.unwrap().unwrap(), json!({"b": 2}));
    assert!(frames.next().await.is_none());
}

#[tokio::test]
async fn test_invalid_line_reports_raw_text() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"ok\":true}\nnot json at all\n")
        .build();
    let mut frames = FramedRead::new(reader, JsonLinesCodec::new());

    assert!(frames.next().await.unwrap().is_ok());
    match frames.next().await.unwrap() {
        Err(ClaudeError::FrameDecode { raw, .. }) => assert_eq!(raw, "not json at all"),
        other => panic!("expected a frame decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_frame_size_limit() {
    let big = format!("{{\"data\":\"{}\"}}\n", "x".repeat(4096));
    let reader = tokio_test::io::Builder::new().read(big.as_bytes()).build();
    let mut frames = FramedRead::new(reader, JsonLinesCodec::with_max_length(1024));

    assert!(matches!(
        frames.next().await.unwrap(),
        Err(ClaudeError::FrameDecode { .. })
    ));
}

#[tokio::test]
async fn test_stream_transport_round_trip() {
    let (client_read, mut peer_write) = tokio::io::duplex(4096);
    let (peer_read, client_write) = tokio::io::duplex(4096);
    let mut transport = StreamTransport::new(client_read, client_write);

    assert!(!transport.is_ready());
    assert!(transport.write("{}\n").await.is_err());

    transport.connect().await.unwrap();
    assert!(transport.is_ready());
    transport
        .write(&encode_line(&json!({"type": "user"})).unwrap())
        .await
        .unwrap();
    transport
        .write(&encode_line(&json!({"type": "control_request"})).unwrap())
        .await
        .unwrap();

    let mut lines = BufReader::new(peer_read).lines();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "{\"type\":\"user\"}");
    assert_eq!(
        lines.next_line().await.unwrap().unwrap(),
        "{\"type\":\"control_request\"}"
    );

    let mut frames = transport.read_messages();
    peer_write.write_all(b"{\"type\":\"res").await.unwrap();
    peer_write.write_all(b"ult\"}\n").await.unwrap();
    drop(peer_write);
    assert_eq!(frames.recv().await.unwrap().unwrap(), json!({"type": "result"}));
    assert!(frames.recv().await.is_none());

    transport.close().await.unwrap();
    assert!(!transport.is_ready());
    assert!(lines.next_line().await.unwrap().is_none());
}
