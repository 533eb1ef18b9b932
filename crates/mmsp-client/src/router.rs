//! Notification router: classifies inbound frames.
//!
//! A frame whose `method` carries the `notification:` prefix is a server push
//! and goes to subscribers; a frame with a numeric `id` is a reply and goes to
//! the correlator. Anything else is logged and dropped, as is a frame that is
//! not a JSON object.

use mmsp_core::{ClientError, Notification, Result};
use serde_json::Value;
use tracing::warn;

use crate::wire::{NOTIFICATION_PREFIX, RawEnvelope, Reply};

/// What an inbound frame turned out to be.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Server push for subscribers.
    Notification(Notification),
    /// Answer to a call.
    Reply(Reply),
    /// Well-formed JSON that is neither.
    Unrecognized,
}

/// Classify a raw frame.
pub fn classify(raw: &str) -> Result<Inbound> {
    let malformed = |reason: String| ClientError::MalformedMessage { reason };

    let value: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".into()));
    }
    let envelope: RawEnvelope = serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;

    if let Some(topic) = envelope
        .method
        .as_deref()
        .and_then(|m| m.strip_prefix(NOTIFICATION_PREFIX))
    {
        let params = envelope.params.clone().unwrap_or(Value::Null);
        return Ok(Inbound::Notification(Notification::new(topic, params)));
    }

    match envelope.id.as_ref().and_then(Value::as_u64) {
        Some(id) => Ok(Inbound::Reply(Reply::from_raw(id, envelope))),
        None => Ok(Inbound::Unrecognized),
    }
}

/// Where a frame should go after classification.
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    /// Fan out to notification subscribers.
    Notify(Notification),
    /// Hand to the correlator.
    Resolve(Reply),
}

/// Classify `raw`, logging and dropping anything that is not routable.
pub fn route(raw: &str) -> Option<Route> {
    match classify(raw) {
        Ok(Inbound::Notification(n)) => Some(Route::Notify(n)),
        Ok(Inbound::Reply(reply)) => Some(Route::Resolve(reply)),
        Ok(Inbound::Unrecognized) => {
            warn!(len = raw.len(), "dropping unrecognized message");
            None
        }
        Err(e) => {
            warn!(error = %e, len = raw.len(), "dropping malformed message");
            None
        }
    }
}
