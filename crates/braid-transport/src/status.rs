//! Connection lifecycle status.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// The state of the gateway connection, published on a watch channel.
///
/// The UI shows the status whenever it is not `Connected`, gating the rest
/// of the interface. Display strings match the wire-level status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// No connection has been established yet.
    Disconnected,
    /// The socket is open and sends are accepted.
    Connected,
    /// The socket failed; no further events will arrive.
    Error,
    /// The socket closed; no further events will arrive.
    Closed,
}

impl ConnectionStatus {
    /// Whether sends are currently accepted.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_status_labels() {
        assert_eq!(ConnectionStatus::Connected.to_string(), "CONNECTED");
        assert_eq!(ConnectionStatus::Disconnected.to_string(), "DISCONNECTED");
        assert_eq!(ConnectionStatus::Error.to_string(), "ERROR");
        assert_eq!(ConnectionStatus::Closed.to_string(), "CLOSED");
    }

    #[test]
    fn test_only_connected_accepts_sends() {
        assert!(ConnectionStatus::Connected.is_connected());
        assert!(!ConnectionStatus::Closed.is_connected());
        assert!(!ConnectionStatus::Error.is_connected());
        assert!(!ConnectionStatus::Disconnected.is_connected());
    }
}
