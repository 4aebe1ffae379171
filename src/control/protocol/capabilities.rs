//! Client capability flags
//!
//! Derived from the session configuration; inbound control requests for a
//! capability the client does not have are answered with an error.

use bitflags::bitflags;

bitflags! {
    /// What this client can answer on behalf of the CLI
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClientCapabilities: u8 {
        /// Hook callbacks are registered
        const HOOKS = 0b0001;
        /// A `can_use_tool` callback is configured
        const PERMISSIONS = 0b0010;
        /// In-process MCP servers are registered
        const SDK_MCP = 0b0100;
        /// Interrupts can be sent
        const INTERRUPTS = 0b1000;
    }
}

impl ClientCapabilities {
    /// Capability needed to answer an inbound request subtype, if any
    #[must_use]
    pub fn required_for(subtype: &str) -> Option<Self> {
        match subtype {
            "hook_callback" => Some(Self::HOOKS),
            "can_use_tool" => Some(Self::PERMISSIONS),
            "mcp_message" => Some(Self::SDK_MCP),
            _ => None,
        }
    }

    /// Human readable names of the enabled capabilities
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}
