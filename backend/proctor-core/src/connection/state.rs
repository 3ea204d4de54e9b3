use std::fmt::{Display, Formatter, Result as FormatResult};

/// Lifecycle of the single connection to the desktop bridge.
///
/// Written only by [`ConnectionManager`](super::ConnectionManager); everyone
/// else reads it or watches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Never connected, or the connection was lost.
    Disconnected,
    Connecting,
    Open,
    /// Closed on purpose by the application.
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// States from which `connect()` starts a fresh attempt.
    pub(crate) fn can_dial(&self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Closed)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}
