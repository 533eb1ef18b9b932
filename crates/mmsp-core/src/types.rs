//! Records exchanged with the management server.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the wire
//! format. Optional fields are omitted when `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A player known to the server.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    /// Profile UUID.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Player {
    /// Name-only reference to this player.
    pub fn to_ref(&self) -> PlayerRef {
        PlayerRef::new(self.name.clone())
    }
}

/// A player addressed by name only (allowlist, ban and operator edits).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Player name.
    pub name: String,
}

impl PlayerRef {
    /// Create a reference from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An operator entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    /// The operator.
    pub player: Player,
    /// Permission level (0–4).
    pub permission_level: u8,
    /// Whether the operator may join a full server.
    pub bypasses_player_limit: bool,
}

/// A name ban entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ban {
    /// Banned player.
    pub player: Player,
    /// Ban reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Expiry timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    /// Who issued the ban.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// An IP ban entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpBan {
    /// Banned address.
    pub ip: String,
    /// Ban reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Expiry timestamp as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    /// Who issued the ban.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Value of a game rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameRuleValue {
    /// Boolean rule.
    Bool(bool),
    /// Integer rule.
    Integer(i64),
    /// Anything else, passed through as text.
    Text(String),
}

impl fmt::Display for GameRuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for GameRuleValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for GameRuleValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for GameRuleValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl GameRuleValue {
    /// Parse user input: `true`/`false`, then integers, else text.
    pub fn parse(input: &str) -> Self {
        match input {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            other => other
                .parse::<i64>()
                .map_or_else(|_| Self::Text(other.to_owned()), Self::Integer),
        }
    }
}

/// A game rule and its current value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRule {
    /// Rule key (e.g. `doDaylightCycle`).
    pub key: String,
    /// Current value.
    pub value: GameRuleValue,
    /// Declared type (`boolean` or `integer`).
    #[serde(rename = "type")]
    pub kind: String,
}

/// Server status as reported by `server/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// Server version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Message of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    /// Player slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    /// Players currently online.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_players: Option<u32>,
    /// Online player list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    /// Whether the status call succeeded.
    #[serde(default)]
    pub is_online: bool,
}

impl ServerStatus {
    /// Status reported when the server could not be reached.
    pub fn offline() -> Self {
        Self::default()
    }
}

/// Server settings. Every field is optional so the same type serves as a
/// partial update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    /// Periodic world saving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave: Option<bool>,
    /// Difficulty name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Kick players not on the allowlist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_allowlist: Option<bool>,
    /// Player slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    /// Minutes before idle players are kicked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_idle_timeout: Option<u32>,
    /// Allow flight in survival.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_flight: Option<bool>,
    /// Message of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motd: Option<String>,
    /// Default game mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_game_mode: Option<String>,
    /// View distance in chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_distance: Option<u32>,
    /// Simulation distance in chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_distance: Option<u32>,
    /// Status heartbeat interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<u32>,
    /// Entity broadcast range percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_broadcast_range: Option<u32>,
}

impl ServerSettings {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
