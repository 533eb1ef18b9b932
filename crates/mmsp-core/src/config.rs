//! Remote endpoint description.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one remote management endpoint.
///
/// Immutable once a connection attempt starts; the client shares it as an
/// `Arc<ConnectionConfig>` so the reconnection supervisor retries against the
/// same value the caller passed in.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Use `wss://` instead of `ws://`.
    #[serde(default)]
    pub use_tls: bool,
    /// Shared secret presented as a bearer token during the handshake.
    #[serde(default)]
    pub secret: String,
}

impl ConnectionConfig {
    /// Create a plain (non-TLS) config.
    pub fn new(host: impl Into<String>, port: u16, secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            use_tls: false,
            secret: secret.into(),
        }
    }

    /// Builder-style TLS toggle.
    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// WebSocket URL for this endpoint.
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Value of the `Authorization` header sent on upgrade.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.secret)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url() {
        let config = ConnectionConfig::new("localhost", 25585, "s3cret");
        assert_eq!(config.url(), "ws://localhost:25585");
    }

    #[test]
    fn tls_url() {
        let config = ConnectionConfig::new("mc.example.org", 443, "").with_tls(true);
        assert_eq!(config.url(), "wss://mc.example.org:443");
    }

    #[test]
    fn bearer_header() {
        let config = ConnectionConfig::new("localhost", 25585, "abc123");
        assert_eq!(config.bearer(), "Bearer abc123");
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ConnectionConfig::new("localhost", 25585, "hunter2");
        let out = format!("{config:?}");
        assert!(!out.contains("hunter2"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"host":"h","port":1,"useTls":true}"#).unwrap();
        assert!(config.use_tls);
        assert_eq!(config.secret, "");
    }
}
