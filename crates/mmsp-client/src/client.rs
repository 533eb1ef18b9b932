//! Protocol client facade.
//!
//! [`MmspClient`] is a cheap, cloneable handle over shared state guarded by
//! one mutex. The mutex is never held across an `.await` or while observer
//! callbacks run. Inbound frames are handled sequentially on the transport's
//! I/O task; events from a transport that has since been replaced are
//! ignored by generation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use mmsp_core::{ClientError, ConnectionConfig, ConnectionState, Notification, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::correlator::{CallReceiver, Correlator};
use crate::observers::{Observers, Subscription};
use crate::router::{self, Route};
use crate::supervisor::{DEFAULT_RECONNECT_DELAY, ReconnectSupervisor, SupervisorState};
use crate::transport::{Connector, EventHandler, TransportConnection, TransportEvent, WsConnector};
use crate::wire::CallEnvelope;

/// Default deadline for a call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Error recorded when the peer drops the connection without a transport
/// error.
pub const UNEXPECTED_CLOSE: &str = "connection closed unexpectedly";

/// Client tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientOptions {
    /// Deadline applied by [`MmspClient::call`].
    pub call_timeout: Duration,
    /// Delay before each reconnection attempt.
    pub reconnect_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Explicit,
    Retry,
}

/// Handle to one management connection.
///
/// Clones share the same connection, pending calls and subscribers.
#[derive(Clone)]
pub struct MmspClient {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    core: Mutex<Core>,
    notifications: Observers<Notification>,
    state_changes: StateFeed,
}

struct Core {
    state: ConnectionState,
    transport: Option<TransportConnection>,
    correlator: Correlator,
    supervisor: ReconnectSupervisor,
    /// Tag of the most recently spawned transport.
    generation: u64,
    /// Bumped by every connect and disconnect; a handshake that completes
    /// under a stale value has been superseded.
    attempt: u64,
    /// Bumped on every state change; orders snapshots for delivery.
    state_seq: u64,
    last_transport_error: Option<String>,
}

/// A state change and its position in the change sequence.
type Snapshot = (u64, ConnectionState);

impl Core {
    fn is_current(&self, generation: u64) -> bool {
        self.transport
            .as_ref()
            .is_some_and(|t| t.generation() == generation)
    }

    /// Close the transport and fail every pending call with `reason`.
    fn teardown(&mut self, reason: &ClientError) -> usize {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.last_transport_error = None;
        let rejected = self.correlator.reject_all(reason);
        if rejected > 0 {
            debug!(rejected, %reason, "pending calls rejected");
        }
        rejected
    }

    /// Replace the state; returns the new snapshot if it differs.
    fn set_state(&mut self, next: ConnectionState) -> Option<Snapshot> {
        if self.state == next {
            return None;
        }
        self.state = next;
        self.state_seq += 1;
        Some((self.state_seq, self.state.clone()))
    }
}

/// Delivers state snapshots to observers in sequence order.
///
/// Snapshots are taken under the core lock but published after it is
/// released, so two threads may publish out of order. Whoever finds the
/// feed idle drains it lowest sequence first; a snapshot older than one
/// already delivered is dropped. Callbacks run with no lock held.
#[derive(Default)]
struct StateFeed {
    observers: Observers<ConnectionState>,
    queue: Mutex<FeedQueue>,
}

#[derive(Default)]
struct FeedQueue {
    delivered: u64,
    pending: BTreeMap<u64, ConnectionState>,
    draining: bool,
}

impl StateFeed {
    fn subscribe(
        &self,
        callback: impl Fn(&ConnectionState) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    fn publish(&self, (seq, state): Snapshot) {
        {
            let mut queue = self.queue.lock();
            if seq <= queue.delivered {
                debug!(seq, delivered = queue.delivered, "dropping stale state snapshot");
                return;
            }
            let _ = queue.pending.insert(seq, state);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        loop {
            let next = {
                let mut queue = self.queue.lock();
                let Some((seq, state)) = queue.pending.pop_first() else {
                    queue.draining = false;
                    return;
                };
                queue.delivered = seq;
                state
            };
            self.observers.emit(&next);
        }
    }
}

impl MmspClient {
    /// Client over WebSockets with default options.
    pub fn new() -> Self {
        Self::with_options(ClientOptions::default())
    }

    /// Client over WebSockets.
    pub fn with_options(options: ClientOptions) -> Self {
        Self::with_connector(Arc::new(WsConnector), options)
    }

    /// Client over a custom [`Connector`].
    pub fn with_connector(connector: Arc<dyn Connector>, options: ClientOptions) -> Self {
        let core = Core {
            state: ConnectionState::disconnected(),
            transport: None,
            correlator: Correlator::new(),
            supervisor: ReconnectSupervisor::new(options.reconnect_delay),
            generation: 0,
            attempt: 0,
            state_seq: 0,
            last_transport_error: None,
        };
        Self {
            inner: Arc::new(Inner {
                connector,
                options,
                core: Mutex::new(core),
                notifications: Observers::new(),
                state_changes: StateFeed::default(),
            }),
        }
    }

    /// Options this client was built with.
    pub fn options(&self) -> ClientOptions {
        self.inner.options
    }

    // ── Connection lifecycle ────────────────────────────────────────

    /// Open a connection to `config`, tearing down any existing one first.
    ///
    /// On failure the state records the error and no retry is scheduled.
    pub async fn connect(&self, config: ConnectionConfig) -> Result<()> {
        self.inner.connect(Arc::new(config), Origin::Explicit).await
    }

    /// Close the connection and stop reconnecting. Pending calls fail with
    /// [`ClientError::ConnectionClosed`]. Idempotent.
    pub fn disconnect(&self) {
        let changed = {
            let mut core = self.inner.core.lock();
            core.supervisor.stop();
            core.attempt += 1;
            let _ = core.teardown(&ClientError::ConnectionClosed);
            core.set_state(ConnectionState::disconnected())
        };
        if changed.is_some() {
            info!("disconnected");
        }
        self.inner.emit_state(changed);
    }

    /// Snapshot of the connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.core.lock().state.clone()
    }

    /// Whether calls may be issued.
    pub fn is_connected(&self) -> bool {
        self.inner.core.lock().state.is_connected()
    }

    /// Reconnection supervisor state.
    pub fn supervisor_state(&self) -> SupervisorState {
        self.inner.core.lock().supervisor.state()
    }

    /// Number of calls awaiting a reply.
    pub fn pending_calls(&self) -> usize {
        self.inner.core.lock().correlator.len()
    }

    // ── Subscriptions ───────────────────────────────────────────────

    /// Receive every server notification, in arrival order.
    pub fn on_notification(
        &self,
        callback: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.notifications.subscribe(callback)
    }

    /// Receive every connection state change.
    pub fn on_state_change(
        &self,
        callback: impl Fn(&ConnectionState) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.state_changes.subscribe(callback)
    }

    // ── Calls ───────────────────────────────────────────────────────

    /// Invoke `method` with the default deadline.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        self.call_with_timeout(method, params, self.inner.options.call_timeout)
            .await
    }

    /// Invoke `method`, failing with [`ClientError::Timeout`] if no reply
    /// arrives within `timeout`.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Vec<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        let (id, rx) = self.inner.dispatch(method, &params)?;
        let guard = PendingGuard {
            inner: &self.inner,
            id,
        };

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::ConnectionClosed),
            Err(_) => {
                drop(guard);
                let timeout_ms = timeout.as_millis() as u64;
                warn!(id, method, timeout_ms, "call timed out");
                Err(ClientError::Timeout {
                    method: method.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    /// Invoke `method` and decode the result as `T`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for MmspClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MmspClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("MmspClient")
            .field("status", &core.state.status)
            .field("pending", &core.correlator.len())
            .field("supervisor", &core.supervisor.state())
            .finish_non_exhaustive()
    }
}

/// Removes a call's pending entry if its caller stops waiting.
struct PendingGuard<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let _ = self.inner.core.lock().correlator.expire(self.id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internals
// ─────────────────────────────────────────────────────────────────────────────

impl Inner {
    async fn connect(self: &Arc<Self>, config: Arc<ConnectionConfig>, origin: Origin) -> Result<()> {
        let (attempt, changed) = {
            let mut core = self.core.lock();
            if origin == Origin::Explicit {
                core.supervisor.stop();
            }
            let _ = core.teardown(&ClientError::ConnectionClosed);
            core.attempt += 1;
            let attempt = core.attempt;
            (attempt, core.set_state(ConnectionState::connecting(Arc::clone(&config))))
        };
        self.emit_state(changed);
        info!(url = %config.url(), ?origin, "connecting");

        let outcome = self.connector.connect(&config).await;

        let (result, changed) = {
            let mut core = self.core.lock();
            if core.attempt != attempt {
                debug!(url = %config.url(), "connect attempt superseded");
                return Err(ClientError::ConnectionClosed);
            }
            match outcome {
                Ok(socket) => {
                    core.generation += 1;
                    let generation = core.generation;
                    core.transport = Some(TransportConnection::spawn(
                        generation,
                        socket,
                        self.event_handler(),
                    ));
                    core.supervisor.on_connected(Arc::clone(&config));
                    info!(url = %config.url(), generation, "connected");
                    (Ok(()), core.set_state(ConnectionState::connected(config)))
                }
                Err(err) => {
                    let reason = match err {
                        ClientError::HandshakeFailed { reason } => reason,
                        other => other.to_string(),
                    };
                    warn!(url = %config.url(), %reason, "connection failed");
                    if origin == Origin::Retry && core.supervisor.on_retry_failed() {
                        self.arm_retry(&mut core);
                    }
                    let changed = core.set_state(ConnectionState::failed(config, reason.clone()));
                    (Err(ClientError::HandshakeFailed { reason }), changed)
                }
            }
        };
        self.emit_state(changed);
        result
    }

    fn dispatch(&self, method: &str, params: &[Value]) -> Result<(u64, CallReceiver)> {
        let mut guard = self.core.lock();
        let core = &mut *guard;
        let transport = match core.transport.as_ref() {
            Some(transport) if core.state.is_connected() => transport,
            _ => return Err(ClientError::NotConnected),
        };

        let (id, rx) = core.correlator.register(method);
        let sent = CallEnvelope::new(id, method, params)
            .encode()
            .and_then(|frame| transport.send(frame));
        if let Err(err) = sent {
            let _ = core.correlator.expire(id);
            return Err(err);
        }
        debug!(id, method, "call dispatched");
        Ok((id, rx))
    }

    fn event_handler(self: &Arc<Self>) -> EventHandler {
        let weak: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |generation, event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_event(generation, event);
            }
        })
    }

    fn handle_event(self: &Arc<Self>, generation: u64, event: TransportEvent) {
        match event {
            TransportEvent::Open => debug!(generation, "transport open"),
            TransportEvent::Message(raw) => {
                if !self.core.lock().is_current(generation) {
                    return;
                }
                match router::route(&raw) {
                    Some(Route::Notify(notification)) => {
                        debug!(topic = %notification.topic, "notification received");
                        self.notifications.emit(&notification);
                    }
                    Some(Route::Resolve(reply)) => {
                        let _ = self.core.lock().correlator.resolve(reply);
                    }
                    None => {}
                }
            }
            TransportEvent::Error(err) => {
                let mut core = self.core.lock();
                if core.is_current(generation) {
                    warn!(generation, error = %err, "transport error");
                    core.last_transport_error = Some(err.to_string());
                }
            }
            TransportEvent::Closed => self.handle_close(generation),
        }
    }

    fn handle_close(self: &Arc<Self>, generation: u64) {
        let changed = {
            let mut core = self.core.lock();
            if !core.is_current(generation) {
                return;
            }
            let reason = core
                .last_transport_error
                .take()
                .unwrap_or_else(|| UNEXPECTED_CLOSE.to_string());
            let rejected = core.teardown(&ClientError::ConnectionClosed);
            warn!(generation, rejected, %reason, "connection lost");

            if core.supervisor.on_unexpected_close() {
                self.arm_retry(&mut core);
            }
            let next = match core.state.config.clone() {
                Some(config) => ConnectionState::failed(config, reason),
                None => ConnectionState::disconnected(),
            };
            core.set_state(next)
        };
        self.emit_state(changed);
    }

    fn arm_retry(self: &Arc<Self>, core: &mut Core) {
        let weak = Arc::downgrade(self);
        let delay = core.supervisor.delay();
        core.supervisor.arm(|epoch| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Some(inner) = weak.upgrade() {
                    inner.retry(epoch).await;
                }
            })
        });
        info!(
            delay_ms = delay.as_millis() as u64,
            failed_retries = core.supervisor.failed_retries(),
            "reconnect scheduled"
        );
    }

    fn retry(self: Arc<Self>, epoch: u64) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let claimed = {
                let mut core = self.core.lock();
                core.supervisor.claim(epoch)
            };
            let Some(config) = claimed else {
                return;
            };
            info!(url = %config.url(), "attempting reconnect");
            if let Err(err) = self.connect(config, Origin::Retry).await {
                debug!(error = %err, "reconnect attempt failed");
            }
        })
    }

    fn emit_state(&self, changed: Option<Snapshot>) {
        if let Some(snapshot) = changed {
            self.state_changes.publish(snapshot);
        }
    }
}
