//! Request correlator: matches replies to the calls that are waiting on them.
//!
//! Ids are allocated from a per-client counter that starts at 1 and is never
//! reset, so an id is never reused within the client's lifetime. Each pending
//! call owns a oneshot completion; resolving, expiring or rejecting removes
//! the entry, so every call completes at most once.

use std::collections::HashMap;
use std::time::Instant;

use mmsp_core::{ClientError, Result};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::wire::Reply;

/// Receiving half of a pending call.
pub type CallReceiver = oneshot::Receiver<Result<Value>>;

struct PendingCall {
    method: String,
    completion: oneshot::Sender<Result<Value>>,
    dispatched_at: Instant,
}

/// Outstanding calls keyed by id.
#[derive(Default)]
pub struct Correlator {
    last_id: u64,
    pending: HashMap<u64, PendingCall>,
}

impl Correlator {
    /// Empty correlator; the first id handed out is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for `method` and park a completion under it.
    pub fn register(&mut self, method: &str) -> (u64, CallReceiver) {
        self.last_id += 1;
        let id = self.last_id;
        let (completion, rx) = oneshot::channel();
        let _ = self.pending.insert(
            id,
            PendingCall {
                method: method.to_string(),
                completion,
                dispatched_at: Instant::now(),
            },
        );
        (id, rx)
    }

    /// Complete the call `reply` answers. Replies for unknown ids (already
    /// timed out, or never issued) are dropped and return `false`.
    pub fn resolve(&mut self, reply: Reply) -> bool {
        let Some(call) = self.pending.remove(&reply.id) else {
            debug!(id = reply.id, "dropping reply with no pending call");
            return false;
        };
        let result = reply
            .outcome
            .map_err(|message| ClientError::RemoteError { message });
        debug!(
            id = reply.id,
            method = %call.method,
            ok = result.is_ok(),
            elapsed_ms = call.dispatched_at.elapsed().as_millis() as u64,
            "call resolved"
        );
        let _ = call.completion.send(result);
        true
    }

    /// Remove call `id` without completing it. Returns its method if it was
    /// still pending.
    pub fn expire(&mut self, id: u64) -> Option<String> {
        self.pending.remove(&id).map(|call| call.method)
    }

    /// Fail every pending call with `error`. Returns how many were failed.
    pub fn reject_all(&mut self, error: &ClientError) -> usize {
        let count = self.pending.len();
        for (id, call) in self.pending.drain() {
            debug!(id, method = %call.method, %error, "rejecting pending call");
            let _ = call.completion.send(Err(error.clone()));
        }
        count
    }

    /// Whether call `id` is still waiting.
    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of waiting calls.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no calls are waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Most recently allocated id (0 before the first call).
    pub fn last_id(&self) -> u64 {
        self.last_id
    }
}
