//! Settings type definitions.
//!
//! camelCase JSON. Every struct is `#[serde(default)]` so a settings file only
//! needs the keys it changes.

use std::time::Duration;

use mmsp_core::logging::LogFormat;
use serde::{Deserialize, Serialize};

/// Default per-call reply deadline.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;
/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;

/// Root settings type.
///
/// ```json
/// {
///   "client": { "callTimeoutMs": 10000 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MmspSettings {
    /// Settings schema version.
    pub version: String,
    /// Protocol client tuning.
    pub client: ClientSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Profile name used when none is given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,
}

impl Default for MmspSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            client: ClientSettings::default(),
            logging: LoggingSettings::default(),
            active_profile: None,
        }
    }
}

/// Protocol client tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Reply deadline for each call.
    pub call_timeout_ms: u64,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay_ms: u64,
}

impl ClientSettings {
    /// Call timeout as a `Duration`.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Reconnect delay as a `Duration`.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive (e.g. `warn`, `mmsp_client=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}
