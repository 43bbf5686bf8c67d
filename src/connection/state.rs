//! Client connection states.

/// Lifecycle of a single connection attempt.
///
/// `Connecting` is entered at construction, `Connected` only after the
/// server's accept key checks out, and `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Upgrade request in flight.
    #[default]
    Connecting,
    /// Handshake verified; frames may be sent.
    Connected,
    /// Closed, rejected or terminated. No further transitions.
    Disconnected,
}

impl ConnectionState {
    /// Only `Connected` permits send, ping, pong and close.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}
