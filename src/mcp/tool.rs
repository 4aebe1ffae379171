//! Tool definitions for in-process MCP servers

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A tool implementation
///
/// Implemented for any `Fn(serde_json::Value) -> impl Future<Output = Result<ToolResult>>`.
pub trait ToolHandler: Send + Sync {
    /// Run the tool with already validated arguments
    fn invoke(&self, input: serde_json::Value) -> BoxFuture<'static, Result<ToolResult>>;
}

impl<F, Fut> ToolHandler for F
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult>> + Send + 'static,
{
    fn invoke(&self, input: serde_json::Value) -> BoxFuture<'static, Result<ToolResult>> {
        Box::pin(self(input))
    }
}

/// A tool that can be invoked by Claude
///
/// # Example
///
/// ```rust
/// use kodegen_claude_runtime::mcp::{SdkMcpTool, ToolResult};
/// use serde_json::json;
///
/// let add = SdkMcpTool::new(
///     "add",
///     "Add two numbers together",
///     json!({
///         "type": "object",
///         "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
///         "required": ["a", "b"]
///     }),
///     |input| async move {
///         let sum = input["a"].as_f64().unwrap_or(0.0) + input["b"].as_f64().unwrap_or(0.0);
///         Ok(ToolResult::text(sum.to_string()))
///     },
/// );
/// assert_eq!(add.name(), "add");
/// ```
#[derive(Clone)]
pub struct SdkMcpTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
    handler: Arc<dyn ToolHandler>,
}

impl SdkMcpTool {
    /// Create a new tool
    ///
    /// # Arguments
    ///
    /// * `name` - Tool identifier, unique within its server
    /// * `description` - What the tool does
    /// * `input_schema` - JSON schema the arguments are validated against
    /// * `handler` - Async function to execute the tool
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
        handler: F,
    ) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult>> + Send + 'static,
    {
        Self::from_handler(name, description, input_schema, Arc::new(handler))
    }

    /// Create a tool from an existing handler
    pub fn from_handler(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler,
        }
    }

    /// Create a tool whose arguments deserialize into `A`
    ///
    /// The input schema is generated from `A`.
    pub fn typed<A, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        A: JsonSchema + DeserializeOwned + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult>> + Send + 'static,
    {
        let input_schema = serde_json::to_value(schemars::schema_for!(A))
            .unwrap_or_else(|_| serde_json::json!({"type": "object"}));

        Self::new(name, description, input_schema, move |input| {
            let call = serde_json::from_value::<A>(input).map(|args| handler(args));
            async move {
                match call {
                    Ok(pending) => pending.await,
                    Err(e) => Ok(ToolResult::error(format!("Invalid arguments: {e}"))),
                }
            }
        })
    }

    /// Get the tool name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the tool description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the input schema
    #[must_use]
    pub const fn input_schema(&self) -> &serde_json::Value {
        &self.input_schema
    }

    /// Invoke the handler without validation or failure capture
    ///
    /// # Errors
    /// Returns whatever the handler returns
    pub async fn invoke(&self, input: serde_json::Value) -> Result<ToolResult> {
        self.handler.invoke(input).await
    }

    /// Tool description in MCP `tools/list` format
    pub(crate) fn to_tool_info(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

impl std::fmt::Debug for SdkMcpTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkMcpTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// Result returned by a tool handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content blocks (text, images, etc.)
    pub content: Vec<ToolContent>,
    /// Whether this result represents an error
    #[serde(default, rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Create an error result
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: Some(true),
        }
    }

    /// Whether this result reports a failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}

/// Content block in a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content
    Text {
        /// The text content
        text: String,
    },
    /// Image content (base64 encoded)
    Image {
        /// Base64 encoded image data
        data: String,
        /// MIME type (e.g., "image/png")
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}
