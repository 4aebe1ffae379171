// Command-line driver for the Claude Code runtime
//
// Sends the prompt given on the command line to a fresh CLI session, refuses
// destructive Bash commands through a PreToolUse hook, and prints the
// conversation as it streams in. Set RUST_LOG=debug to see control traffic.

use anyhow::{Context, Result, bail};
use futures::StreamExt;
use kodegen_claude_runtime::{
    ClaudeAgentOptions, ClaudeSDKClient, ContentBlock, HookEvent, HookManager,
    HookMatcherBuilder, HookOutput, Message,
};

const BLOCKED_PATTERNS: &[&str] = &["rm -rf", "mkfs", "dd if="];

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if prompt.trim().is_empty() {
        bail!("usage: kodegen-claude-runtime <prompt>");
    }

    let guard = HookManager::callback(|input, _tool_use_id, _context| async move {
        let command = input["tool_input"]["command"].as_str().unwrap_or_default();
        if let Some(pattern) = BLOCKED_PATTERNS.iter().find(|p| command.contains(*p)) {
            log::warn!("Blocking Bash command containing {pattern:?}");
            return Ok(HookOutput::deny(
                HookEvent::PreToolUse,
                format!("Commands containing {pattern:?} are not allowed"),
            ));
        }
        Ok(HookOutput::default())
    });

    let options = ClaudeAgentOptions::builder()
        .add_hook(
            HookEvent::PreToolUse,
            HookMatcherBuilder::new(Some("Bash")).add_hook(guard).build(),
        )
        .build();

    let mut client = ClaudeSDKClient::new(options, None)
        .await
        .context("Failed to start Claude Code session")?;
    log::info!("Connected to Claude Code ({})", client.capabilities().names().join(", "));

    client.send_message(prompt).await?;

    let mut outcome = Ok(());
    {
        let response = client.receive_response();
        futures::pin_mut!(response);
        while let Some(message) = response.next().await {
            match message {
                Ok(Message::Assistant { message, .. }) => {
                    for block in message.content {
                        match block {
                            ContentBlock::Text(text) => println!("{}", text.text),
                            ContentBlock::ToolUse(tool) => {
                                println!("[tool] {} {}", tool.name, tool.input);
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Message::Result {
                    is_error,
                    num_turns,
                    total_cost_usd,
                    ..
                }) => {
                    log::info!(
                        "Finished after {num_turns} turn(s), cost ${:.4}{}",
                        total_cost_usd.unwrap_or_default(),
                        if is_error { " (error)" } else { "" }
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    outcome = Err(anyhow::Error::new(e).context("Session failed"));
                }
            }
        }
    }

    client.close().await?;
    outcome
}
