//! Wire envelopes.
//!
//! ```text
//! call:          {"jsonrpc":"2.0","id":7,"method":"minecraft:players/list","params":[]}
//! reply:         {"id":7,"result":[...]}  |  {"id":7,"error":{"message":"..."}}
//! notification:  {"method":"notification:players/joined","params":{...}}
//! ```

use mmsp_core::{ClientError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method prefix that marks a server push.
pub const NOTIFICATION_PREFIX: &str = "notification:";

/// Protocol version tag sent on every call.
pub const JSONRPC_VERSION: &str = "2.0";

/// Message used when an error reply carries no message.
pub const UNKNOWN_REMOTE_ERROR: &str = "Unknown error";

/// Outbound call.
#[derive(Debug, Serialize)]
pub struct CallEnvelope<'a> {
    jsonrpc: &'static str,
    /// Correlation id.
    pub id: u64,
    /// Remote method name.
    pub method: &'a str,
    /// Ordered argument list.
    pub params: &'a [Value],
}

impl<'a> CallEnvelope<'a> {
    /// Build a call envelope.
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// Serialize to the text frame sent on the socket.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ClientError::invalid_argument(e.to_string()))
    }
}

/// Loosely-typed inbound envelope; every field optional so classification
/// can decide what the message is.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawEnvelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// A decoded reply to one call.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    /// Correlation id of the call being answered.
    pub id: u64,
    /// Result value, or the peer's error message.
    pub outcome: std::result::Result<Value, String>,
}

impl Reply {
    pub(crate) fn from_raw(id: u64, raw: RawEnvelope) -> Self {
        let outcome = match raw.error {
            Some(err) if !err.is_null() => Err(error_message(&err)),
            _ => Ok(raw.result.unwrap_or(Value::Null)),
        };
        Self { id, outcome }
    }
}

fn error_message(err: &Value) -> String {
    err.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .or_else(|| err.as_str())
        .unwrap_or(UNKNOWN_REMOTE_ERROR)
        .to_string()
}
