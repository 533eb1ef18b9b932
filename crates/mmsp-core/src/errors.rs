//! Client error taxonomy.
//!
//! Per-call errors (`NotConnected`, `Timeout`, `RemoteError`, `Decode`,
//! `InvalidArgument`) are returned to the caller only. Connection-level
//! errors (`HandshakeFailed`, `Transport`, `ConnectionClosed`) are also
//! reflected in [`ConnectionState`](crate::ConnectionState).

use thiserror::Error;

/// Errors produced by the protocol client.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// A call was attempted with no open transport.
    #[error("not connected to server")]
    NotConnected,

    /// No reply arrived within the call's deadline.
    #[error("request timed out after {timeout_ms}ms: {method}")]
    Timeout {
        /// Method that was called.
        method: String,
        /// Deadline that elapsed.
        timeout_ms: u64,
    },

    /// The peer answered with an error reply.
    #[error("{message}")]
    RemoteError {
        /// Peer-supplied message, verbatim.
        message: String,
    },

    /// The connection was torn down while the call was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// The initial connection exchange was rejected or failed.
    #[error("connection failed: {reason}")]
    HandshakeFailed {
        /// Why the handshake failed.
        reason: String,
    },

    /// An inbound payload could not be understood.
    #[error("malformed message: {reason}")]
    MalformedMessage {
        /// Parse failure detail.
        reason: String,
    },

    /// Socket-level I/O failure on an open connection.
    #[error("transport error: {reason}")]
    Transport {
        /// Underlying error text.
        reason: String,
    },

    /// A typed wrapper rejected its arguments before dispatch.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: String,
    },

    /// A reply did not decode into the operation's return type.
    #[error("failed to decode result of {method}: {reason}")]
    Decode {
        /// Method whose result was undecodable.
        method: String,
        /// Decoder error text.
        reason: String,
    },
}

impl ClientError {
    /// Build an [`ClientError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether the error concerns the connection rather than a single call.
    pub fn is_connection_level(&self) -> bool {
        matches!(
            self,
            Self::HandshakeFailed { .. } | Self::Transport { .. } | Self::ConnectionClosed
        )
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_connected_display() {
        assert_eq!(ClientError::NotConnected.to_string(), "not connected to server");
    }

    #[test]
    fn timeout_display() {
        let err = ClientError::Timeout {
            method: "minecraft:players/list".into(),
            timeout_ms: 30_000,
        };
        assert!(err.to_string().contains("30000ms"));
        assert!(err.to_string().contains("minecraft:players/list"));
    }

    #[test]
    fn remote_error_is_verbatim() {
        let err = ClientError::RemoteError {
            message: "Player not found".into(),
        };
        assert_eq!(err.to_string(), "Player not found");
    }

    #[test]
    fn handshake_failed_display() {
        let err = ClientError::HandshakeFailed {
            reason: "HTTP error: 401 Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "connection failed: HTTP error: 401 Unauthorized");
    }

    #[test]
    fn invalid_argument_helper() {
        let err = ClientError::invalid_argument("player name must not be empty");
        assert_eq!(
            err,
            ClientError::InvalidArgument {
                message: "player name must not be empty".into()
            }
        );
    }

    #[test]
    fn connection_level_classification() {
        assert!(ClientError::ConnectionClosed.is_connection_level());
        assert!(
            ClientError::HandshakeFailed {
                reason: "refused".into()
            }
            .is_connection_level()
        );
        assert!(!ClientError::NotConnected.is_connection_level());
        assert!(
            !ClientError::RemoteError {
                message: "x".into()
            }
            .is_connection_level()
        );
    }
}
