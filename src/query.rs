//! One-shot queries
//!
//! [`query`] starts a session, sends a single prompt, yields the response up
//! to and including its `Result` message, then closes the session. Hooks,
//! permission callbacks and in-process tools configured in the options are
//! served while the query runs.

use futures::Stream;

use crate::client::ClaudeSDKClient;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::messages::Message;
use crate::types::options::ClaudeAgentOptions;

/// Run a single prompt against a freshly started Claude Code CLI
///
/// # Arguments
/// * `prompt` - The prompt to send
/// * `options` - Optional configuration (defaults to `ClaudeAgentOptions::default()`)
///
/// # Errors
/// Returns error if the CLI cannot be found or the session cannot start.
/// Errors after that are yielded by the stream.
///
/// # Examples
///
/// ```no_run
/// use kodegen_claude_runtime::{query, ClaudeAgentOptions};
/// use futures::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let options = ClaudeAgentOptions::builder()
///         .system_prompt("You are a helpful coding assistant")
///         .max_turns(1)
///         .build();
///
///     let stream = query("Write a hello world in Rust", Some(options)).await?;
///     let mut stream = Box::pin(stream);
///
///     while let Some(message) = stream.next().await {
///         log::info!("{:?}", message?);
///     }
///     Ok(())
/// }
/// ```
pub async fn query(
    prompt: impl Into<String>,
    options: Option<ClaudeAgentOptions>,
) -> Result<impl Stream<Item = Result<Message>>> {
    let client = ClaudeSDKClient::new(options.unwrap_or_default(), None).await?;
    Ok(drive(client, prompt.into()))
}

/// Run a single prompt over the given transport
///
/// # Errors
/// Returns error if the session cannot start
pub async fn query_with_transport<T: Transport + 'static>(
    prompt: impl Into<String>,
    options: Option<ClaudeAgentOptions>,
    transport: T,
) -> Result<impl Stream<Item = Result<Message>>> {
    let client = ClaudeSDKClient::with_transport(options.unwrap_or_default(), transport).await?;
    Ok(drive(client, prompt.into()))
}

fn drive<T: Transport + 'static>(
    mut client: ClaudeSDKClient<T>,
    prompt: String,
) -> impl Stream<Item = Result<Message>> {
    async_stream::stream! {
        match client.send_message(prompt).await {
            Err(e) => yield Err(e),
            Ok(()) => {
                while let Some(message) = client.next_message().await {
                    let done = match message {
                        Ok(ref message) => message.is_result(),
                        Err(_) => true,
                    };
                    yield message;
                    if done {
                        break;
                    }
                }
            }
        }

        if let Err(e) = client.close().await {
            log::debug!("Error closing query session: {e}");
        }
    }
}
