//! Tests for control protocol wire types

use kodegen_claude_runtime::{
    ClaudeError, ClientCapabilities, ControlRequest, ControlResponse, PermissionMode, RequestId,
    ToolName,
};
use serde_json::json;

#[test]
fn test_outbound_request_frames() {
    let id = RequestId::new("req_3_0a1b2c3d");

    assert_eq!(
        ControlRequest::SetPermissionMode {
            mode: PermissionMode::BypassPermissions
        }
        .to_frame(&id)
        .unwrap(),
        json!({
            "type": "control_request",
            "request_id": "req_3_0a1b2c3d",
            "request": {"subtype": "set_permission_mode", "mode": "bypassPermissions"}
        })
    );

    let init = ControlRequest::Initialize {
        hooks: Some(json!({"Stop": [{"matcher": null, "hookCallbackIds": ["hook_Stop"]}]})),
    }
    .to_frame(&id)
    .unwrap();
    assert_eq!(init["request"]["subtype"], "initialize");
    assert_eq!(init["request"]["hooks"]["Stop"][0]["hookCallbackIds"][0], "hook_Stop");
}

#[test]
fn test_inbound_request_bodies_decode() {
    let request: ControlRequest = serde_json::from_value(json!({
        "subtype": "can_use_tool",
        "tool_name": "Bash",
        "input": {"command": "ls"},
        "permission_suggestions": [{"type": "setMode", "mode": "acceptEdits", "destination": "session"}]
    }))
    .unwrap();
    match request {
        ControlRequest::CanUseTool {
            tool_name,
            permission_suggestions,
            blocked_path,
            ..
        } => {
            assert_eq!(tool_name, ToolName::new("Bash"));
            assert_eq!(permission_suggestions.map(|s| s.len()), Some(1));
            assert_eq!(blocked_path, None);
        }
        other => panic!("unexpected request {other:?}"),
    }

    let request: ControlRequest = serde_json::from_value(json!({
        "subtype": "mcp_message",
        "server_name": "calc",
        "message": {"jsonrpc": "2.0", "id": 1, "method": "tools/list"}
    }))
    .unwrap();
    assert_eq!(request.subtype(), "mcp_message");

    assert!(serde_json::from_value::<ControlRequest>(json!({"subtype": "rewind_files"})).is_err());
}

#[test]
fn test_response_from_outcome() {
    let ok = ControlResponse::from_result(RequestId::new("cli_1"), Ok(json!({"x": 1})));
    assert_eq!(ok.request_id().as_str(), "cli_1");
    assert_eq!(
        ok.to_frame().unwrap()["response"],
        json!({"subtype": "success", "request_id": "cli_1", "response": {"x": 1}})
    );

    let err = ControlResponse::from_result(
        RequestId::new("cli_2"),
        Err(ClaudeError::hook("hook exploded")),
    );
    assert!(matches!(err, ControlResponse::Error { ref error, .. } if error.contains("hook exploded")));
}

#[test]
fn test_capabilities_gate_inbound_subtypes() {
    assert_eq!(
        ClientCapabilities::required_for("can_use_tool"),
        Some(ClientCapabilities::PERMISSIONS)
    );
    assert_eq!(
        ClientCapabilities::required_for("hook_callback"),
        Some(ClientCapabilities::HOOKS)
    );
    assert_eq!(
        ClientCapabilities::required_for("mcp_message"),
        Some(ClientCapabilities::SDK_MCP)
    );

    let caps = ClientCapabilities::INTERRUPTS | ClientCapabilities::HOOKS;
    assert!(caps.contains(ClientCapabilities::HOOKS));
    assert!(!caps.contains(ClientCapabilities::PERMISSIONS));
}
