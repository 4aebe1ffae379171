//! Message-related type definitions
//!
//! This module contains types for representing messages, content blocks,
//! and various message formats used in conversations with Claude.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::identifiers::SessionId;

// ============================================================================
// Content Blocks
// ============================================================================

/// Content value for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    /// String content
    String(String),
    /// Structured content blocks
    Blocks(Vec<serde_json::Value>),
}

/// Plain text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Text content
    pub text: String,
}

/// Extended thinking block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingBlock {
    /// Thinking content
    pub thinking: String,
    /// Signature for verification
    #[serde(default)]
    pub signature: String,
}

/// Tool use request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    /// Tool use ID
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool input parameters
    pub input: serde_json::Value,
}

/// Tool execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// ID of the tool use this is a result for
    pub tool_use_id: String,
    /// Result content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentValue>,
    /// Whether this is an error result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

/// Content block types
///
/// Block types this crate does not know about are kept as
/// [`ContentBlock::Unknown`] and serialize back to the exact value received.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Text content block
    Text(TextBlock),
    /// Thinking content block (extended thinking)
    Thinking(ThinkingBlock),
    /// Tool use request
    ToolUse(ToolUseBlock),
    /// Tool execution result
    ToolResult(ToolResultBlock),
    /// Unrecognized block, preserved verbatim
    Unknown(serde_json::Value),
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBlock { text: text.into() })
    }

    /// Text of this block, if it is a text block
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(block) => Some(&block.text),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownBlockRef<'a> {
    Text(&'a TextBlock),
    Thinking(&'a ThinkingBlock),
    ToolUse(&'a ToolUseBlock),
    ToolResult(&'a ToolResultBlock),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownBlock {
    Text(TextBlock),
    Thinking(ThinkingBlock),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Text(block) => KnownBlockRef::Text(block).serialize(serializer),
            Self::Thinking(block) => KnownBlockRef::Thinking(block).serialize(serializer),
            Self::ToolUse(block) => KnownBlockRef::ToolUse(block).serialize(serializer),
            Self::ToolResult(block) => KnownBlockRef::ToolResult(block).serialize(serializer),
            Self::Unknown(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let kind = raw
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| de::Error::missing_field("type"))?;

        match kind {
            "text" | "thinking" | "tool_use" | "tool_result" => {
                let known = KnownBlock::deserialize(raw).map_err(de::Error::custom)?;
                Ok(match known {
                    KnownBlock::Text(block) => Self::Text(block),
                    KnownBlock::Thinking(block) => Self::Thinking(block),
                    KnownBlock::ToolUse(block) => Self::ToolUse(block),
                    KnownBlock::ToolResult(block) => Self::ToolResult(block),
                })
            }
            _ => Ok(Self::Unknown(raw)),
        }
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// User message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessageContent {
    /// Message role (always "user")
    pub role: String,
    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<UserContent>,
}

/// User content can be string or blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    /// Plain string content
    String(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

impl From<String> for UserContent {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<&str> for UserContent {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl From<Vec<ContentBlock>> for UserContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        Self::Blocks(blocks)
    }
}

/// Assistant message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessageContent {
    /// Model that generated the message
    pub model: String,
    /// Message content blocks
    pub content: Vec<ContentBlock>,
}

/// Conversation output, discriminated by the `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// User message
    User {
        /// Parent tool use ID for nested conversations
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
        /// Message content
        message: UserMessageContent,
        /// Session ID
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// Assistant message
    Assistant {
        /// Parent tool use ID for nested conversations
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
        /// Message content
        message: AssistantMessageContent,
        /// Session ID
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// System message
    System {
        /// System message subtype
        subtype: String,
        /// Additional system message data
        #[serde(flatten)]
        data: serde_json::Value,
    },
    /// Result message with metrics, marks the end of a turn
    Result {
        /// Result subtype
        subtype: String,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// API call duration in milliseconds
        duration_api_ms: u64,
        /// Whether this is an error result
        is_error: bool,
        /// Number of conversation turns
        num_turns: u32,
        /// Session ID
        session_id: SessionId,
        /// Total cost in USD
        #[serde(skip_serializing_if = "Option::is_none")]
        total_cost_usd: Option<f64>,
        /// Token usage statistics
        #[serde(skip_serializing_if = "Option::is_none")]
        usage: Option<serde_json::Value>,
        /// Result message
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    /// Stream event for partial messages
    StreamEvent {
        /// Event UUID
        uuid: String,
        /// Session ID
        session_id: SessionId,
        /// Raw stream event data
        event: serde_json::Value,
        /// Parent tool use ID
        #[serde(skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
}

impl Message {
    /// Session id assigned by the CLI, when the message carries one
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::User { session_id, .. } | Self::Assistant { session_id, .. } => {
                session_id.as_ref().map(SessionId::as_str)
            }
            Self::Result { session_id, .. } | Self::StreamEvent { session_id, .. } => {
                Some(session_id.as_str())
            }
            Self::System { data, .. } => data.get("session_id").and_then(serde_json::Value::as_str),
        }
    }

    /// Whether this message ends a turn
    #[must_use]
    pub const fn is_result(&self) -> bool {
        matches!(self, Self::Result { .. })
    }
}
