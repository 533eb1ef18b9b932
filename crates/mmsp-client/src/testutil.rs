//! In-memory sockets and connectors for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::channel::mpsc as fmpsc;
use futures::{SinkExt, StreamExt};
use mmsp_core::{ClientError, ConnectionConfig, Result};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::transport::{Connector, Socket};

/// Server side of an in-memory socket.
pub(crate) struct PeerEnd {
    from_client: fmpsc::UnboundedReceiver<String>,
    to_client: fmpsc::UnboundedSender<Result<String>>,
}

/// A socket whose far end is driven by the test.
pub(crate) fn channel_socket() -> (Socket, PeerEnd) {
    let (client_tx, from_client) = fmpsc::unbounded::<String>();
    let (to_client, client_rx) = fmpsc::unbounded::<Result<String>>();
    let sink = client_tx.sink_map_err(|e| ClientError::Transport {
        reason: e.to_string(),
    });
    let socket = Socket {
        sink: Box::pin(sink),
        stream: Box::pin(client_rx),
    };
    (
        socket,
        PeerEnd {
            from_client,
            to_client,
        },
    )
}

impl PeerEnd {
    /// Next raw frame written by the client, `None` once it hangs up.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.from_client.next().await
    }

    /// Next call written by the client, parsed.
    pub async fn next_call(&mut self) -> Value {
        let frame = self.next_frame().await.expect("client hung up");
        serde_json::from_str(&frame).expect("client sent invalid JSON")
    }

    /// Deliver a JSON frame to the client.
    pub fn push(&self, value: &Value) {
        self.push_raw(&value.to_string());
    }

    /// Deliver a raw text frame to the client.
    pub fn push_raw(&self, text: &str) {
        let _ = self.to_client.unbounded_send(Ok(text.to_string()));
    }

    /// Answer call `id` with `result`.
    pub fn reply(&self, id: &Value, result: Value) {
        self.push(&json!({"jsonrpc": "2.0", "id": id, "result": result}));
    }

    /// Answer call `id` with an error.
    pub fn reply_error(&self, id: &Value, message: &str) {
        self.push(&json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32000, "message": message}}));
    }

    /// Push a server notification.
    pub fn notify(&self, topic: &str, params: Value) {
        self.push(&json!({"jsonrpc": "2.0", "method": format!("notification:{topic}"), "params": params}));
    }

    /// Fail the client's read side.
    pub fn fail(&self, reason: &str) {
        let _ = self.to_client.unbounded_send(Err(ClientError::Transport {
            reason: reason.to_string(),
        }));
    }

    /// Drop the connection from the server side.
    pub fn hang_up(self) {}

    /// Answer every call with `respond(call)` in a background task; returns
    /// the calls seen so far.
    pub fn serve(
        mut self,
        respond: impl Fn(&Value) -> Value + Send + 'static,
    ) -> Arc<Mutex<Vec<Value>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        drop(tokio::spawn(async move {
            while let Some(frame) = self.next_frame().await {
                let Ok(call) = serde_json::from_str::<Value>(&frame) else {
                    continue;
                };
                let result = respond(&call);
                log.lock().push(call.clone());
                self.reply(&call["id"], result);
            }
        }));
        seen
    }
}

/// Connector handing out in-memory sockets; each accepted connection's
/// [`PeerEnd`] is delivered on the channel returned by [`ChannelConnector::new`].
pub(crate) struct ChannelConnector {
    attempts: AtomicUsize,
    refuse: AtomicBool,
    peers: mpsc::UnboundedSender<PeerEnd>,
}

impl ChannelConnector {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PeerEnd>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            attempts: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
            peers,
        });
        (connector, rx)
    }

    /// Number of `connect` calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Make subsequent handshakes fail.
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Socket> {
        let _ = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ClientError::HandshakeFailed {
                reason: "connection refused".into(),
            });
        }
        let (socket, peer) = channel_socket();
        let _ = self.peers.send(peer);
        Ok(socket)
    }
}

/// Local endpoint used throughout the tests.
pub(crate) fn local_config() -> ConnectionConfig {
    ConnectionConfig::new("localhost", 25585, "s3cret")
}
