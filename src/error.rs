//! Error types for the Claude Code runtime

use thiserror::Error;

/// Main error type for the Claude Code runtime
#[derive(Error, Debug)]
pub enum ClaudeError {
    /// Claude Code CLI not found or not installed
    #[error("Claude Code CLI not found: {0}")]
    CliNotFound(String),

    /// The session could not be established (spawn or initialize handshake failed)
    #[error("Startup failed: {0}")]
    Startup(String),

    /// Connection error when communicating with Claude Code
    #[error("Connection error: {0}")]
    Connection(String),

    /// The connection ended while an operation was still waiting on it
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Process execution error with exit code and stderr
    #[error("Process error (exit code {exit_code}): {message}")]
    Process {
        /// Error message
        message: String,
        /// Process exit code (`-1` when terminated by a signal)
        exit_code: i32,
        /// Tail of the process standard error output
        stderr: Option<String>,
    },

    /// JSON decode error
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// A line read from the process was not a valid JSON value
    #[error("Frame decode error: {message}")]
    FrameDecode {
        /// Error message
        message: String,
        /// The offending line, as received
        raw: String,
    },

    /// Message parse error with optional raw data
    #[error("Message parse error: {message}")]
    MessageParse {
        /// Error message
        message: String,
        /// Raw message data that failed to parse
        data: Option<serde_json::Value>,
    },

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Control protocol error (including error responses from the peer)
    #[error("Control protocol error: {0}")]
    ControlProtocol(String),

    /// Hook execution error
    #[error("Hook error: {0}")]
    Hook(String),

    /// MCP (Model Context Protocol) error
    #[error("MCP error: {0}")]
    Mcp(String),

    /// No in-process tool is registered under the requested name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, ClaudeError>;

impl ClaudeError {
    /// Create a CLI not found error
    #[must_use]
    pub fn cli_not_found() -> Self {
        Self::CliNotFound(
            "Claude Code not found. Install with:\n\
             npm install -g @anthropic-ai/claude-code\n\
             \n\
             If already installed locally, try:\n\
             export PATH=\"$HOME/node_modules/.bin:$PATH\"\n\
             \n\
             Or specify the path when creating transport"
                .to_string(),
        )
    }

    /// Create a startup error
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a connection closed error
    pub fn connection_closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed(reason.into())
    }

    /// Create a process error
    pub fn process(msg: impl Into<String>, exit_code: i32, stderr: Option<String>) -> Self {
        Self::Process {
            message: msg.into(),
            exit_code,
            stderr,
        }
    }

    /// Create a frame decode error, keeping the raw line
    pub fn frame_decode(msg: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::FrameDecode {
            message: msg.into(),
            raw: raw.into(),
        }
    }

    /// Create a message parse error
    pub fn message_parse(msg: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::MessageParse {
            message: msg.into(),
            data,
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a control protocol error
    pub fn control_protocol(msg: impl Into<String>) -> Self {
        Self::ControlProtocol(msg.into())
    }

    /// Create a hook error
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Create an MCP error
    pub fn mcp(msg: impl Into<String>) -> Self {
        Self::Mcp(msg.into())
    }

    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound(name.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Rebuild this error for another waiter
    ///
    /// Variants carrying owned data are reproduced field for field. Wrapped
    /// `serde_json` errors become `MessageParse` with the same message.
    #[must_use]
    pub fn replicate(&self) -> Self {
        match self {
            Self::CliNotFound(msg) => Self::CliNotFound(msg.clone()),
            Self::Startup(msg) => Self::Startup(msg.clone()),
            Self::Connection(msg) => Self::Connection(msg.clone()),
            Self::ConnectionClosed(msg) => Self::ConnectionClosed(msg.clone()),
            Self::Process {
                message,
                exit_code,
                stderr,
            } => Self::process(message.clone(), *exit_code, stderr.clone()),
            Self::JsonDecode(e) => Self::message_parse(e.to_string(), None),
            Self::FrameDecode { message, raw } => Self::frame_decode(message.clone(), raw.clone()),
            Self::MessageParse { message, data } => Self::message_parse(message.clone(), data.clone()),
            Self::Transport(msg) => Self::Transport(msg.clone()),
            Self::ControlProtocol(msg) => Self::ControlProtocol(msg.clone()),
            Self::Hook(msg) => Self::Hook(msg.clone()),
            Self::Mcp(msg) => Self::Mcp(msg.clone()),
            Self::ToolNotFound(msg) => Self::ToolNotFound(msg.clone()),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Timeout(msg) => Self::Timeout(msg.clone()),
            Self::InvalidConfig(msg) => Self::InvalidConfig(msg.clone()),
        }
    }

    /// Whether this error ends the session it occurred in.
    ///
    /// Startup, decode and process-exit failures are fatal. Timeouts, control
    /// error responses and hook/tool failures only affect the operation that
    /// raised them.
    #[must_use]
    pub const fn is_session_fatal(&self) -> bool {
        match self {
            Self::CliNotFound(_)
            | Self::Startup(_)
            | Self::Connection(_)
            | Self::ConnectionClosed(_)
            | Self::Process { .. }
            | Self::JsonDecode(_)
            | Self::FrameDecode { .. }
            | Self::MessageParse { .. }
            | Self::Io(_)
            | Self::InvalidConfig(_) => true,
            Self::Transport(_)
            | Self::ControlProtocol(_)
            | Self::Hook(_)
            | Self::Mcp(_)
            | Self::ToolNotFound(_)
            | Self::Timeout(_) => false,
        }
    }
}
