//! In-process MCP servers
//!
//! Tools registered here run inside the client process. The CLI reaches them
//! through `mcp_message` control requests carrying MCP JSON-RPC, which the
//! [`ToolBridge`] routes to the named [`SdkMcpServer`].

pub mod bridge;
pub mod protocol;
pub mod server;
pub mod tool;

pub use bridge::ToolBridge;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::SdkMcpServer;
pub use tool::{SdkMcpTool, ToolContent, ToolHandler, ToolResult};
