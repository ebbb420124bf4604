use std::fmt::{Display, Formatter, Result as FmtResult};

/// Connectivity of the shared realtime connection.
///
/// Starts at [`ConnectionState::Disconnected`] and oscillates for the
/// lifetime of the process; there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection is established or being established.
    #[default]
    Disconnected,
    /// A connect has been issued and the transport has not acknowledged yet.
    Connecting,
    /// The transport acknowledged the connection.
    Connected,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    }
}
