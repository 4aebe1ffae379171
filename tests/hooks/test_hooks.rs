//! Tests for hook registration and dispatch

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kodegen_claude_runtime::{
    ClaudeError, HookCallback, HookEvent, HookManager, HookMatcherBuilder, HookOutput,
};
use serde_json::json;

fn counting(counter: &Arc<AtomicUsize>, output: HookOutput) -> HookCallback {
    let counter = Arc::clone(counter);
    HookManager::callback(move |_input, _tool_use_id, _context| {
        let counter = Arc::clone(&counter);
        let output = output.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(output)
        }
    })
}

#[tokio::test]
async fn test_matchers_select_tools() {
    let manager = HookManager::new();
    let bash = Arc::new(AtomicUsize::new(0));
    let edits = Arc::new(AtomicUsize::new(0));
    let all = Arc::new(AtomicUsize::new(0));

    manager.register(
        HookEvent::PreToolUse,
        HookMatcherBuilder::new(Some("Bash"))
            .add_hook(counting(&bash, HookOutput::default()))
            .build(),
    );
    manager.register(
        HookEvent::PreToolUse,
        HookMatcherBuilder::new(Some("Write|Edit"))
            .add_hook(counting(&edits, HookOutput::default()))
            .build(),
    );
    manager.register(
        HookEvent::PreToolUse,
        HookMatcherBuilder::new(None::<String>)
            .add_hook(counting(&all, HookOutput::default()))
            .build(),
    );

    manager
        .dispatch(HookEvent::PreToolUse, Some("Edit"), json!({}), None)
        .await;
    manager
        .dispatch(HookEvent::PreToolUse, Some("Bash"), json!({}), None)
        .await;
    manager
        .dispatch(HookEvent::PostToolUse, Some("Bash"), json!({}), None)
        .await;

    assert_eq!(bash.load(Ordering::SeqCst), 1);
    assert_eq!(edits.load(Ordering::SeqCst), 1);
    assert_eq!(all.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_deny_short_circuits() {
    let manager = HookManager::new();
    let after = Arc::new(AtomicUsize::new(0));
    let before = Arc::new(AtomicUsize::new(0));

    manager.register(
        HookEvent::PreToolUse,
        HookMatcherBuilder::new(Some("Bash"))
            .add_hook(counting(&before, HookOutput::message("checked")))
            .add_hook(counting(
                &Arc::new(AtomicUsize::new(0)),
                HookOutput::deny(HookEvent::PreToolUse, "blocked"),
            ))
            .add_hook(counting(&after, HookOutput::default()))
            .build(),
    );

    let output = manager
        .dispatch(HookEvent::PreToolUse, Some("Bash"), json!({}), None)
        .await;

    assert!(output.is_deny());
    assert_eq!(output.system_message, None);
    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_outputs_merge_last_write_wins() {
    let manager = HookManager::new();
    let counter = Arc::new(AtomicUsize::new(0));

    manager.register(
        HookEvent::UserPromptSubmit,
        HookMatcherBuilder::new(None::<String>)
            .add_hook(counting(
                &counter,
                HookOutput {
                    system_message: Some("first".into()),
                    reason: Some("kept".into()),
                    ..HookOutput::default()
                },
            ))
            .add_hook(counting(&counter, HookOutput::message("second")))
            .build(),
    );

    let output = manager
        .dispatch(HookEvent::UserPromptSubmit, None, json!({"prompt": "hi"}), None)
        .await;

    assert_eq!(output.system_message.as_deref(), Some("second"));
    assert_eq!(output.reason.as_deref(), Some("kept"));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failing_and_panicking_hooks_are_skipped() {
    let manager = HookManager::new();

    let failing = HookManager::callback(|_input, _tool_use_id, _context| async move {
        Err(ClaudeError::hook("boom"))
    });
    let panicking = HookManager::callback(|_input, _tool_use_id, _context| async move {
        if true {
            panic!("hook panicked");
        }
        Ok(HookOutput::default())
    });
    let counter = Arc::new(AtomicUsize::new(0));

    manager.register(
        HookEvent::Stop,
        HookMatcherBuilder::new(None::<String>)
            .add_hook(failing)
            .add_hook(panicking)
            .add_hook(counting(&counter, HookOutput::message("still ran")))
            .build(),
    );

    let output = manager.dispatch(HookEvent::Stop, None, json!({}), None).await;
    assert_eq!(output.system_message.as_deref(), Some("still ran"));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_handle_callback_routes_by_id() {
    let manager = HookManager::new();
    let seen = Arc::new(parking_lot::Mutex::new(None));
    let captured = Arc::clone(&seen);

    manager.register(
        HookEvent::PostToolUse,
        HookMatcherBuilder::new(Some("Read"))
            .add_hook(HookManager::callback(move |input, tool_use_id, context| {
                let captured = Arc::clone(&captured);
                async move {
                    *captured.lock() = Some((input, tool_use_id, context.tool_name));
                    Ok(HookOutput::default())
                }
            }))
            .build(),
    );

    let input = json!({"hook_event_name": "PostToolUse", "tool_name": "Read"});
    manager
        .handle_callback(Some("hook_PostToolUse"), input.clone(), Some("toolu_5".into()))
        .await
        .unwrap();

    let (got_input, tool_use_id, tool_name) = seen.lock().take().unwrap();
    assert_eq!(got_input, input);
    assert_eq!(tool_use_id.as_deref(), Some("toolu_5"));
    assert_eq!(tool_name.unwrap().as_str(), "Read");

    let err = manager
        .handle_callback(Some("hook_Bogus"), json!({}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Hook(_)));
}

#[test]
fn test_initialize_config_lists_registered_events() {
    let manager = HookManager::new();
    assert!(manager.is_empty());
    assert_eq!(manager.initialize_config(), None);

    let counter = Arc::new(AtomicUsize::new(0));
    for event in [HookEvent::Stop, HookEvent::PreToolUse] {
        manager.register(
            event,
            HookMatcherBuilder::new(Some("*"))
                .add_hook(counting(&counter, HookOutput::default()))
                .build(),
        );
    }

    assert_eq!(
        manager.registered_events(),
        vec![HookEvent::PreToolUse, HookEvent::Stop]
    );
    assert_eq!(
        manager.initialize_config(),
        Some(json!({
            "PreToolUse": [{"matcher": null, "hookCallbackIds": ["hook_PreToolUse"]}],
            "Stop": [{"matcher": null, "hookCallbackIds": ["hook_Stop"]}]
        }))
    );
}
