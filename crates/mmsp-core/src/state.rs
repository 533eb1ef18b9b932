//! Connection state snapshots handed to observers.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ConnectionConfig;

/// Lifecycle status of a client's connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No socket is open.
    #[default]
    Disconnected,
    /// A handshake is in flight.
    Connecting,
    /// The socket is open and calls may be issued.
    Connected,
}

impl ConnectionStatus {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

/// Snapshot of a client's connection state.
///
/// `error` is set only when entering `Disconnected` after a failure (an
/// unexpected close or a failed handshake). `config` is `None` after an
/// explicit disconnect and kept while reconnection is pending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    /// Current status.
    pub status: ConnectionStatus,
    /// Last connection-level error, if the last transition was a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Endpoint being used or retried.
    #[serde(skip)]
    pub config: Option<Arc<ConnectionConfig>>,
}

impl ConnectionState {
    /// Fresh, idle state.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Handshake in flight against `config`.
    pub fn connecting(config: Arc<ConnectionConfig>) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            error: None,
            config: Some(config),
        }
    }

    /// Open connection to `config`.
    pub fn connected(config: Arc<ConnectionConfig>) -> Self {
        Self {
            status: ConnectionStatus::Connected,
            error: None,
            config: Some(config),
        }
    }

    /// Disconnected after a failure; the config is kept for retry.
    pub fn failed(config: Arc<ConnectionConfig>, error: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            error: Some(error.into()),
            config: Some(config),
        }
    }

    /// Whether calls may be issued.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    /// Whether a handshake is in flight.
    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Arc<ConnectionConfig> {
        Arc::new(ConnectionConfig::new("localhost", 25585, ""))
    }

    #[test]
    fn default_is_disconnected_without_config() {
        let state = ConnectionState::default();
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert!(state.error.is_none());
        assert!(state.config.is_none());
    }

    #[test]
    fn connecting_and_connected_are_exclusive() {
        let connecting = ConnectionState::connecting(config());
        assert!(connecting.is_connecting());
        assert!(!connecting.is_connected());

        let connected = ConnectionState::connected(config());
        assert!(connected.is_connected());
        assert!(!connected.is_connecting());
    }

    #[test]
    fn failed_keeps_config_and_error() {
        let state = ConnectionState::failed(config(), "connection refused");
        assert_eq!(state.status, ConnectionStatus::Disconnected);
        assert_eq!(state.error.as_deref(), Some("connection refused"));
        assert!(state.config.is_some());
    }

    #[test]
    fn status_names() {
        assert_eq!(ConnectionStatus::Connecting.as_str(), "connecting");
        assert_eq!(
            serde_json::to_value(ConnectionStatus::Connected).unwrap(),
            "connected"
        );
    }
}
