//! Server push notifications.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Known notification topics.
///
/// Topics the client does not recognise are kept as [`NotificationKind::Other`]
/// and still delivered to subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// `players/joined`
    PlayerJoined,
    /// `players/left`
    PlayerLeft,
    /// `operators/added`
    OperatorAdded,
    /// `operators/removed`
    OperatorRemoved,
    /// `allowlist/updated`
    AllowlistUpdated,
    /// `bans/updated`
    BansUpdated,
    /// `ip_bans/updated`
    IpBansUpdated,
    /// `gamerules/updated`
    GameRulesUpdated,
    /// `server/started`
    ServerStarted,
    /// `server/stopping`
    ServerStopping,
    /// `server/saving`
    ServerSaving,
    /// `server/saved`
    ServerSaved,
    /// `server/status`
    ServerStatus,
    /// Any other topic.
    Other(String),
}

impl NotificationKind {
    /// Classify a topic string.
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "players/joined" => Self::PlayerJoined,
            "players/left" => Self::PlayerLeft,
            "operators/added" => Self::OperatorAdded,
            "operators/removed" => Self::OperatorRemoved,
            "allowlist/updated" => Self::AllowlistUpdated,
            "bans/updated" => Self::BansUpdated,
            "ip_bans/updated" => Self::IpBansUpdated,
            "gamerules/updated" => Self::GameRulesUpdated,
            "server/started" => Self::ServerStarted,
            "server/stopping" => Self::ServerStopping,
            "server/saving" => Self::ServerSaving,
            "server/saved" => Self::ServerSaved,
            "server/status" => Self::ServerStatus,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Topic string on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlayerJoined => "players/joined",
            Self::PlayerLeft => "players/left",
            Self::OperatorAdded => "operators/added",
            Self::OperatorRemoved => "operators/removed",
            Self::AllowlistUpdated => "allowlist/updated",
            Self::BansUpdated => "bans/updated",
            Self::IpBansUpdated => "ip_bans/updated",
            Self::GameRulesUpdated => "gamerules/updated",
            Self::ServerStarted => "server/started",
            Self::ServerStopping => "server/stopping",
            Self::ServerSaving => "server/saving",
            Self::ServerSaved => "server/saved",
            Self::ServerStatus => "server/status",
            Self::Other(topic) => topic,
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NotificationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A notification pushed by the server.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    /// Topic, i.e. the method with the notification prefix removed.
    pub topic: String,
    /// Payload, verbatim (`null` when the peer sent none).
    pub params: Value,
}

impl Notification {
    /// Create a notification.
    pub fn new(topic: impl Into<String>, params: Value) -> Self {
        Self {
            topic: topic.into(),
            params,
        }
    }

    /// Classified topic.
    pub fn kind(&self) -> NotificationKind {
        NotificationKind::from_topic(&self.topic)
    }
}
