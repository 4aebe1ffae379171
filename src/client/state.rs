//! Session lifecycle state

use parking_lot::Mutex;

/// Lifecycle of a client session
///
/// ```text
/// Idle -> Connecting -> Connected <-> Interrupting
///             |             |              |
///             +-------------+--------------+--> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not started
    Idle,
    /// Process started, `initialize` handshake in flight
    Connecting,
    /// Ready for messages
    Connected,
    /// An interrupt request is in flight
    Interrupting,
    /// Terminal; a new session needs a new client
    Closed,
}

impl SessionState {
    /// Whether messages and control requests may be sent
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Connected | Self::Interrupting)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Interrupting => "interrupting",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Shared, lock-protected session state
#[derive(Debug)]
pub(crate) struct StateCell(Mutex<SessionState>);

impl StateCell {
    pub(crate) const fn new() -> Self {
        Self(Mutex::new(SessionState::Idle))
    }

    pub(crate) fn get(&self) -> SessionState {
        *self.0.lock()
    }

    /// Move from `from` to `to`; fails without effect if the current state differs
    pub(crate) fn advance(&self, from: SessionState, to: SessionState) -> bool {
        let mut state = self.0.lock();
        if *state != from {
            return false;
        }
        *state = to;
        log::debug!("Session state {from} -> {to}");
        true
    }

    /// Enter `Closed`, returning the previous state
    pub(crate) fn close(&self) -> SessionState {
        let previous = std::mem::replace(&mut *self.0.lock(), SessionState::Closed);
        if previous != SessionState::Closed {
            log::debug!("Session state {previous} -> closed");
        }
        previous
    }
}
