//! Tests for `SubprocessTransport` against scripted stand-ins for the CLI

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kodegen_claude_runtime::{
    ClaudeAgentOptions, ClaudeError, ClaudeSDKClient, Message, SessionState, SubprocessTransport,
    Transport,
};
use tempfile::TempDir;

#[test]
fn test_find_cli() {
    // Succeeds only where the CLI is installed
    match SubprocessTransport::find_cli() {
        Ok(path) => assert!(path.is_file()),
        Err(e) => assert!(matches!(e, ClaudeError::CliNotFound(_))),
    }
}

#[tokio::test]
async fn test_missing_binary_is_cli_not_found() {
    let mut transport = SubprocessTransport::new(
        ClaudeAgentOptions::default(),
        Some(PathBuf::from("/nonexistent/bin/claude")),
    )
    .unwrap();

    let err = transport.connect().await.unwrap_err();
    assert!(matches!(err, ClaudeError::CliNotFound(_)));
    assert!(!transport.is_ready());
}

#[cfg(unix)]
fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

#[cfg(unix)]
#[tokio::test]
async fn test_nonzero_exit_reports_stderr_tail() {
    let dir = TempDir::new().unwrap();
    let cli = script(
        &dir,
        "claude",
        "echo 'loading settings' >&2\necho 'fatal: invalid API key' >&2\nexit 3\n",
    );

    let captured = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let options = ClaudeAgentOptions::builder()
        .stderr(move |line: &str| sink.lock().push(line.to_string()))
        .build();

    let mut transport = SubprocessTransport::new(options, Some(cli)).unwrap();
    transport.connect().await.unwrap();
    let mut frames = transport.read_messages();

    match tokio::time::timeout(Duration::from_secs(5), frames.recv()).await.unwrap() {
        Some(Err(ClaudeError::Process {
            exit_code, stderr, ..
        })) => {
            assert_eq!(exit_code, 3);
            let stderr = stderr.unwrap();
            assert!(stderr.contains("fatal: invalid API key"), "{stderr}");
        }
        other => panic!("expected a process error, got {other:?}"),
    }
    assert!(frames.recv().await.is_none());
    assert_eq!(captured.lock().len(), 2);

    transport.close().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_clean_exit_ends_stream() {
    let dir = TempDir::new().unwrap();
    let cli = script(
        &dir,
        "claude",
        "printf '{\"type\":\"system\",\"subtype\":\"init\"}\\n'\nexit 0\n",
    );

    let mut transport = SubprocessTransport::new(ClaudeAgentOptions::default(), Some(cli)).unwrap();
    transport.connect().await.unwrap();
    let mut frames = transport.read_messages();

    let frame = frames.recv().await.unwrap().unwrap();
    assert_eq!(frame["subtype"], "init");
    assert!(frames.recv().await.is_none());
    assert_eq!(transport.stderr_tail(), None);

    transport.close().await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_session_over_scripted_cli() {
    let dir = TempDir::new().unwrap();
    // Answers initialize, then one prompt, then waits for stdin to close
    let cli = script(
        &dir,
        "claude",
        r#"read line
id=$(printf '%s' "$line" | sed 's/.*"request_id":"\([^"]*\)".*/\1/')
printf '{"type":"control_response","response":{"subtype":"success","request_id":"%s","response":{}}}\n' "$id"
read prompt
printf '{"type":"assistant","message":{"model":"m","content":[{"type":"text","text":"pong"}]},"session_id":"s1"}\n'
printf '{"type":"result","subtype":"success","duration_ms":1,"duration_api_ms":1,"is_error":false,"num_turns":1,"session_id":"s1"}\n'
cat > /dev/null
"#,
    );

    let options = ClaudeAgentOptions::builder()
        .initialize_timeout(Duration::from_secs(5))
        .build();
    let mut client = ClaudeSDKClient::new(options, Some(cli)).await.unwrap();
    assert_eq!(client.state(), SessionState::Connected);

    client.send_message("ping").await.unwrap();
    let mut texts = Vec::new();
    {
        let response = client.receive_response();
        futures::pin_mut!(response);
        while let Some(message) = response.next().await {
            if let Message::Assistant { message, .. } = message.unwrap() {
                texts.extend(message.content.iter().filter_map(|b| b.as_text().map(String::from)));
            }
        }
    }

    assert_eq!(texts, vec!["pong".to_string()]);
    assert_eq!(client.session_id().unwrap().as_str(), "s1");
    client.close().await.unwrap();
    assert_eq!(client.state(), SessionState::Closed);
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_exit_reaches_pending_request() {
    let dir = TempDir::new().unwrap();
    // Answers initialize, then dies while an interrupt is outstanding
    let cli = script(
        &dir,
        "claude",
        r#"read line
id=$(printf '%s' "$line" | sed 's/.*"request_id":"\([^"]*\)".*/\1/')
printf '{"type":"control_response","response":{"subtype":"success","request_id":"%s","response":{}}}\n' "$id"
read interrupt
echo 'boom: crashed' >&2
exit 7
"#,
    );

    let options = ClaudeAgentOptions::builder()
        .initialize_timeout(Duration::from_secs(5))
        .build();
    let mut client = ClaudeSDKClient::new(options, Some(cli)).await.unwrap();

    match client.interrupt().await {
        Err(ClaudeError::Process {
            exit_code, stderr, ..
        }) => {
            assert_eq!(exit_code, 7);
            assert!(stderr.unwrap().contains("boom: crashed"));
        }
        other => panic!("expected a process error, got {other:?}"),
    }

    assert!(matches!(
        client.next_message().await,
        Some(Err(ClaudeError::Process { exit_code: 7, .. }))
    ));
    assert_eq!(client.state(), SessionState::Closed);
    client.close().await.unwrap();
}
