//! Integration tests for `ClaudeSDKClient`
//!
//! Each test drives a session against an in-memory fake CLI.

#[path = "../common/fake_cli.rs"]
mod fake_cli;

use std::time::Duration;

use fake_cli::{FakeCli, FakeTransport, assistant_text, pair, result_message};
use futures::StreamExt;
use kodegen_claude_runtime::mcp::{SdkMcpServer, SdkMcpTool, ToolResult};
use kodegen_claude_runtime::{
    ClaudeAgentOptions, ClaudeError, ClaudeSDKClient, ClientCapabilities, HookEvent, HookManager,
    HookMatcherBuilder, HookOutput, McpServerConfig, Message, PermissionManager, PermissionMode,
    PermissionResult, SessionState,
};
use serde_json::json;

async fn connect(options: ClaudeAgentOptions) -> (ClaudeSDKClient<FakeTransport>, FakeCli, serde_json::Value) {
    let (transport, mut cli) = pair();
    let (client, init) = tokio::join!(
        ClaudeSDKClient::with_transport(options, transport),
        cli.handshake()
    );
    (client.expect("session starts"), cli, init)
}

fn rm_rf_guard() -> ClaudeAgentOptions {
    let guard = HookManager::callback(|input, _tool_use_id, _context| async move {
        let command = input["tool_input"]["command"].as_str().unwrap_or_default();
        if command.contains("rm -rf") {
            return Ok(HookOutput::deny(HookEvent::PreToolUse, "destructive command"));
        }
        Ok(HookOutput::default())
    });

    ClaudeAgentOptions::builder()
        .add_hook(
            HookEvent::PreToolUse,
            HookMatcherBuilder::new(Some("Bash")).add_hook(guard).build(),
        )
        .build()
}

#[tokio::test]
async fn test_handshake_connects_session() {
    let (client, _cli, init) = connect(ClaudeAgentOptions::default()).await;

    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(init["request"]["hooks"], serde_json::Value::Null);
    assert!(init["request_id"].as_str().unwrap().starts_with("req_1_"));
    assert_eq!(client.server_info().unwrap()["output_style"], "default");
    assert_eq!(client.capabilities(), ClientCapabilities::INTERRUPTS);
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_initialize_advertises_hook_callbacks() {
    let (client, _cli, init) = connect(rm_rf_guard()).await;

    assert_eq!(
        init["request"]["hooks"],
        json!({"PreToolUse": [{"matcher": null, "hookCallbackIds": ["hook_PreToolUse"]}]})
    );
    assert!(client.capabilities().contains(ClientCapabilities::HOOKS));
}

#[tokio::test]
async fn test_refused_initialize_fails_startup() {
    let (transport, mut cli) = pair();
    let refuse = async {
        let request = cli.recv().await;
        cli.reply_error(&request, "unsupported protocol").await;
    };
    let (client, ()) = tokio::join!(
        ClaudeSDKClient::with_transport(ClaudeAgentOptions::default(), transport),
        refuse
    );

    let err = client.err().expect("startup must fail");
    assert!(matches!(err, ClaudeError::Startup(ref msg) if msg.contains("unsupported protocol")));
}

#[tokio::test]
async fn test_initialize_times_out() {
    let (transport, mut cli) = pair();
    let options = ClaudeAgentOptions::builder()
        .initialize_timeout(Duration::from_millis(100))
        .build();
    let ignore = async {
        cli.recv().await;
    };
    let (client, ()) = tokio::join!(ClaudeSDKClient::with_transport(options, transport), ignore);

    assert!(matches!(client.err(), Some(ClaudeError::Startup(_))));
}

#[tokio::test]
async fn test_send_and_receive_response() {
    let (mut client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    client.send_message("Hello").await.unwrap();
    let user = cli.recv().await;
    assert_eq!(
        user,
        json!({
            "type": "user",
            "message": {"role": "user", "content": "Hello"},
            "parent_tool_use_id": null,
            "session_id": "default"
        })
    );

    cli.send(json!({"type": "system", "subtype": "init", "session_id": "sess-1"}))
        .await;
    cli.send(assistant_text("Hi there")).await;
    cli.send(result_message()).await;
    cli.send(assistant_text("next turn")).await;

    let messages: Vec<Message> = {
        let response = client.receive_response();
        futures::pin_mut!(response);
        let mut messages = Vec::new();
        while let Some(message) = response.next().await {
            messages.push(message.unwrap());
        }
        messages
    };

    assert_eq!(messages.len(), 3);
    assert!(matches!(messages[0], Message::System { ref subtype, .. } if subtype == "init"));
    assert!(matches!(messages[1], Message::Assistant { .. }));
    assert!(messages[2].is_result());
    assert_eq!(client.session_id().unwrap().as_str(), "sess-1");

    // The message after the result stays queued for the next turn
    let next = client.next_message().await.unwrap().unwrap();
    assert!(matches!(next, Message::Assistant { .. }));

    client.send_message("again").await.unwrap();
    assert_eq!(cli.recv().await["session_id"], "sess-1");
}

#[tokio::test]
async fn test_hook_callback_denies_destructive_bash() {
    let (mut client, mut cli, _) = connect(rm_rf_guard()).await;

    client.send_message("Clean up the root directory").await.unwrap();
    assert_eq!(cli.recv().await["type"], "user");

    let response = cli
        .request(
            "cli_hook_1",
            json!({
                "subtype": "hook_callback",
                "callback_id": "hook_PreToolUse",
                "input": {
                    "hook_event_name": "PreToolUse",
                    "tool_name": "Bash",
                    "tool_input": {"command": "rm -rf /"}
                },
                "tool_use_id": "toolu_01"
            }),
        )
        .await;

    assert_eq!(response["subtype"], "success");
    assert_eq!(
        response["response"]["hookSpecificOutput"]["permissionDecision"],
        "deny"
    );

    let response = cli
        .request(
            "cli_hook_2",
            json!({
                "subtype": "hook_callback",
                "callback_id": "hook_PreToolUse",
                "input": {
                    "hook_event_name": "PreToolUse",
                    "tool_name": "Bash",
                    "tool_input": {"command": "ls"}
                }
            }),
        )
        .await;
    assert_eq!(response["subtype"], "success");
    assert_eq!(response["response"], json!({}));

    // The CLI reports the refusal instead of running the tool
    cli.send(json!({
        "type": "user",
        "message": {
            "role": "user",
            "content": [{
                "type": "tool_result",
                "tool_use_id": "toolu_01",
                "content": "destructive command",
                "is_error": true
            }]
        },
        "session_id": "sess-1"
    }))
    .await;
    cli.send(result_message()).await;

    let messages: Vec<Message> = client
        .receive_response()
        .map(|message| message.unwrap())
        .collect()
        .await;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| !matches!(m, Message::Assistant { .. })));
}

#[tokio::test]
async fn test_can_use_tool_consults_callback() {
    let callback = PermissionManager::callback(|tool_name, _input, _context| async move {
        if tool_name.as_str() == "Write" {
            Ok(PermissionResult::deny("read-only session"))
        } else {
            Ok(PermissionResult::allow())
        }
    });
    let options = ClaudeAgentOptions::builder().can_use_tool(callback).build();
    let (_client, mut cli, _) = connect(options).await;

    let denied = cli
        .request(
            "cli_perm_1",
            json!({"subtype": "can_use_tool", "tool_name": "Write", "input": {"file_path": "a.txt"}}),
        )
        .await;
    assert_eq!(
        denied["response"],
        json!({"behavior": "deny", "message": "read-only session", "interrupt": false})
    );

    let allowed = cli
        .request(
            "cli_perm_2",
            json!({"subtype": "can_use_tool", "tool_name": "Read", "input": {"file_path": "a.txt"}}),
        )
        .await;
    assert_eq!(
        allowed["response"],
        json!({"behavior": "allow", "updatedInput": {"file_path": "a.txt"}})
    );
}

#[tokio::test]
async fn test_panicking_permission_callback_is_answered() {
    let callback = PermissionManager::callback(|tool_name, _input, _context| async move {
        if tool_name.as_str() == "Bash" {
            panic!("permission callback bug");
        }
        Ok(PermissionResult::allow())
    });
    let options = ClaudeAgentOptions::builder().can_use_tool(callback).build();
    let (client, mut cli, _) = connect(options).await;

    let failed = cli
        .request(
            "cli_perm_1",
            json!({"subtype": "can_use_tool", "tool_name": "Bash", "input": {"command": "ls"}}),
        )
        .await;
    assert_eq!(failed["subtype"], "error");
    assert!(failed["error"].as_str().unwrap().contains("panicked"));

    // The session keeps serving requests
    let allowed = cli
        .request(
            "cli_perm_2",
            json!({"subtype": "can_use_tool", "tool_name": "Read", "input": {"file_path": "a.txt"}}),
        )
        .await;
    assert_eq!(allowed["response"]["behavior"], "allow");
    assert_eq!(client.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_requests_without_handler_are_refused() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let response = cli
        .request(
            "cli_perm_1",
            json!({"subtype": "can_use_tool", "tool_name": "Bash", "input": {}}),
        )
        .await;
    assert_eq!(response["subtype"], "error");

    let response = cli
        .request("cli_unknown", json!({"subtype": "rewind_files"}))
        .await;
    assert_eq!(response["subtype"], "error");

    // Refusals do not end the session
    assert_eq!(client.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_mcp_message_calls_sdk_tool() {
    let calculator = SdkMcpServer::new("calc").tool(SdkMcpTool::new(
        "add",
        "Add two numbers",
        json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        }),
        |input| async move {
            let sum = input["a"].as_f64().unwrap_or(0.0) + input["b"].as_f64().unwrap_or(0.0);
            Ok(ToolResult::text(sum.to_string()))
        },
    ));
    let options = ClaudeAgentOptions::builder()
        .add_mcp_server("calc", McpServerConfig::Sdk(calculator))
        .build();
    let (client, mut cli, _) = connect(options).await;
    assert!(client.capabilities().contains(ClientCapabilities::SDK_MCP));

    let response = cli
        .request(
            "cli_mcp_1",
            json!({
                "subtype": "mcp_message",
                "server_name": "calc",
                "message": {
                    "jsonrpc": "2.0",
                    "id": 7,
                    "method": "tools/call",
                    "params": {"name": "add", "arguments": {"a": 1, "b": 2}}
                }
            }),
        )
        .await;

    assert_eq!(response["subtype"], "success");
    let rpc = &response["response"]["mcp_response"];
    assert_eq!(rpc["id"], 7);
    assert_eq!(rpc["result"]["content"][0]["text"], "3");

    let response = cli
        .request(
            "cli_mcp_2",
            json!({
                "subtype": "mcp_message",
                "server_name": "missing",
                "message": {"jsonrpc": "2.0", "id": 8, "method": "tools/list"}
            }),
        )
        .await;
    assert_eq!(response["subtype"], "error");
}

#[tokio::test]
async fn test_interrupt_round_trip() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let answer = async {
        let request = cli.recv().await;
        assert_eq!(request["request"]["subtype"], "interrupt");
        cli.reply(&request, json!({})).await;
    };
    let (outcome, ()) = tokio::join!(client.interrupt(), answer);

    outcome.unwrap();
    assert_eq!(client.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_interrupt_timeout_returns_to_connected() {
    let (mut client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;
    client.set_control_timeout(Duration::from_millis(100));

    let ignore = async {
        cli.recv().await;
    };
    let (outcome, ()) = tokio::join!(client.interrupt(), ignore);

    assert!(matches!(outcome, Err(ClaudeError::Timeout(_))));
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_abandoned_interrupt_releases_session() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(50), client.interrupt()).await;
    assert!(abandoned.is_err());
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(client.pending_requests(), 0);

    let abandoned = tokio::time::timeout(Duration::from_millis(20), client.set_model(None)).await;
    assert!(abandoned.is_err());
    assert_eq!(client.pending_requests(), 0);

    assert_eq!(cli.recv().await["request"]["subtype"], "interrupt");
    assert_eq!(cli.recv().await["request"]["subtype"], "set_model");

    // A fresh interrupt is accepted and answered
    let answer = async {
        let request = cli.recv().await;
        assert_eq!(request["request"]["subtype"], "interrupt");
        cli.reply(&request, json!({})).await;
    };
    let (outcome, ()) = tokio::join!(client.interrupt(), answer);
    outcome.unwrap();
    assert_eq!(client.state(), SessionState::Connected);
}

#[tokio::test]
async fn test_concurrent_interrupt_is_rejected() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let first = client.interrupt();
    let second = async {
        // Let the first interrupt claim the state
        while client.state() != SessionState::Interrupting {
            tokio::task::yield_now().await;
        }
        client.interrupt().await
    };
    let answer = async {
        let request = cli.recv().await;
        cli.reply(&request, json!({})).await;
    };
    let (first, second, ()) = tokio::join!(first, second, answer);

    first.unwrap();
    assert!(matches!(second, Err(ClaudeError::ControlProtocol(_))));
}

#[tokio::test]
async fn test_set_permission_mode_and_model() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let answer = async {
        let request = cli.recv().await;
        assert_eq!(
            request["request"],
            json!({"subtype": "set_permission_mode", "mode": "acceptEdits"})
        );
        cli.reply(&request, json!({})).await;
    };
    let (outcome, ()) = tokio::join!(client.set_permission_mode(PermissionMode::AcceptEdits), answer);
    outcome.unwrap();

    let refuse = async {
        let request = cli.recv().await;
        assert_eq!(
            request["request"],
            json!({"subtype": "set_model", "model": "claude-opus-4-1"})
        );
        cli.reply_error(&request, "unknown model").await;
    };
    let (outcome, ()) = tokio::join!(client.set_model(Some("claude-opus-4-1".into())), refuse);
    assert!(matches!(outcome, Err(ClaudeError::ControlProtocol(ref msg)) if msg.contains("unknown model")));
}

#[tokio::test]
async fn test_end_of_stream_fails_pending_requests() {
    let (mut client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let hang_up = async {
        cli.recv().await;
        cli.recv().await;
        cli.close_output();
    };
    let (interrupt, set_model, ()) = tokio::join!(
        client.interrupt(),
        client.set_model(Some("claude-haiku-4-5".into())),
        hang_up
    );

    assert!(matches!(interrupt, Err(ClaudeError::ConnectionClosed(_))));
    assert!(matches!(set_model, Err(ClaudeError::ConnectionClosed(_))));
    assert!(client.next_message().await.is_none());
    assert_eq!(client.state(), SessionState::Closed);
    assert!(matches!(
        client.send_message("late").await,
        Err(ClaudeError::ConnectionClosed(_))
    ));
}

#[tokio::test]
async fn test_close_fails_outstanding_requests() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    let closer = async {
        cli.recv().await;
        cli.recv().await;
        client.close().await
    };
    let (interrupt, set_model, closed) = tokio::join!(
        client.interrupt(),
        client.set_model(Some("claude-haiku-4-5".into())),
        closer
    );

    closed.unwrap();
    assert!(matches!(interrupt, Err(ClaudeError::ConnectionClosed(_))));
    assert!(matches!(set_model, Err(ClaudeError::ConnectionClosed(_))));
    assert_eq!(client.pending_requests(), 0);
    assert_eq!(client.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_decode_error_is_terminal() {
    let (mut client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    cli.send(assistant_text("before")).await;
    cli.send_raw("{this is not json\n").await;
    cli.send(assistant_text("after")).await;

    assert!(matches!(
        client.next_message().await,
        Some(Ok(Message::Assistant { .. }))
    ));
    match client.next_message().await {
        Some(Err(e)) => {
            assert!(matches!(e, ClaudeError::FrameDecode { .. }));
            assert!(e.is_session_fatal());
        }
        other => panic!("expected a terminal error, got {other:?}"),
    }
    assert!(client.next_message().await.is_none());
    assert_eq!(client.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_close_ends_input_and_is_idempotent() {
    let (client, mut cli, _) = connect(ClaudeAgentOptions::default()).await;

    client.close().await.unwrap();
    assert_eq!(client.state(), SessionState::Closed);
    assert!(cli.try_recv().await.is_none());

    client.close().await.unwrap();
    assert!(matches!(
        client.interrupt().await,
        Err(ClaudeError::ConnectionClosed(_))
    ));
}
