//! Rolling activity log fed by server notifications.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use mmsp_core::{Notification, NotificationKind};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Entries kept before the oldest are discarded.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 100;

/// What produced an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "topic", rename_all = "lowercase")]
pub enum ActivityKind {
    /// A server notification.
    Notification(NotificationKind),
    /// Recorded by the operator (e.g. a CLI action).
    Manual,
}

/// One line of activity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Unique entry id.
    pub id: Uuid,
    /// Origin of the entry.
    pub kind: ActivityKind,
    /// Human-readable summary.
    pub message: String,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Payload that produced the entry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.timestamp.format("%H:%M:%S");
        match &self.kind {
            ActivityKind::Notification(kind) => write!(f, "{time} [{kind}] {}", self.message),
            ActivityKind::Manual => write!(f, "{time} {}", self.message),
        }
    }
}

/// Summary line for a notification topic.
pub fn describe(kind: &NotificationKind) -> String {
    let fixed = match kind {
        NotificationKind::PlayerJoined => "Player joined the server",
        NotificationKind::PlayerLeft => "Player left the server",
        NotificationKind::OperatorAdded => "Operator added",
        NotificationKind::OperatorRemoved => "Operator removed",
        NotificationKind::AllowlistUpdated => "Allowlist updated",
        NotificationKind::BansUpdated => "Ban list updated",
        NotificationKind::IpBansUpdated => "IP ban list updated",
        NotificationKind::GameRulesUpdated => "Game rule updated",
        NotificationKind::ServerStarted => "Server started",
        NotificationKind::ServerStopping => "Server is stopping",
        NotificationKind::ServerSaving => "Server is saving",
        NotificationKind::ServerSaved => "Server saved",
        NotificationKind::ServerStatus => "Server status update",
        NotificationKind::Other(topic) => return topic.clone(),
    };
    fixed.to_string()
}

/// Bounded, newest-first activity history.
#[derive(Clone, Debug)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl ActivityLog {
    /// Empty log holding [`DEFAULT_ACTIVITY_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ACTIVITY_CAPACITY)
    }

    /// Empty log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a notification under its fixed summary.
    pub fn record_notification(&mut self, notification: &Notification) -> &ActivityEntry {
        let kind = notification.kind();
        let message = describe(&kind);
        let data = (!notification.params.is_null()).then(|| notification.params.clone());
        self.push(ActivityKind::Notification(kind), message, data)
    }

    /// Record an operator action.
    pub fn record_manual(&mut self, message: impl Into<String>, data: Option<Value>) -> &ActivityEntry {
        self.push(ActivityKind::Manual, message.into(), data)
    }

    fn push(&mut self, kind: ActivityKind, message: String, data: Option<Value>) -> &ActivityEntry {
        self.entries.truncate(self.capacity - 1);
        self.entries.push_front(ActivityEntry {
            id: Uuid::now_v7(),
            kind,
            message,
            timestamp: Utc::now(),
            data,
        });
        &self.entries[0]
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
