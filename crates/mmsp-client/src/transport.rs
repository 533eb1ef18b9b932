//! Transport connection: one WebSocket per client, driven by a single I/O
//! task.
//!
//! [`Connector`] performs the handshake and yields a [`Socket`] (a boxed text
//! sink + stream). [`TransportConnection`] owns the I/O task for that socket
//! and reports `Open`, `Message`, `Error` and `Closed` events to its owner,
//! tagged with the generation it was spawned with.

use std::pin::Pin;
use std::sync::{Arc, Once};

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt, future};
use mmsp_core::{ClientError, ConnectionConfig, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, warn};

/// Outbound half of a socket: accepts text frames.
pub type BoxSink = Pin<Box<dyn Sink<String, Error = ClientError> + Send>>;
/// Inbound half of a socket: yields text frames until the peer hangs up.
pub type BoxStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// An open socket, split into its two halves.
pub struct Socket {
    /// Frames to the peer.
    pub sink: BoxSink,
    /// Frames from the peer.
    pub stream: BoxStream,
}

/// Performs the connection handshake for one endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a socket to `config`. Fails with
    /// [`ClientError::HandshakeFailed`] when the peer is unreachable or
    /// rejects the secret.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Socket>;
}

// ─── WebSocket connector ─────────────────────────────────────────────────────

/// Production connector over `tokio-tungstenite`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Socket> {
        if config.use_tls {
            install_crypto_provider();
        }
        let request = handshake_request(config)?;
        let (ws, response) = connect_async(request)
            .await
            .map_err(|e| ClientError::HandshakeFailed {
                reason: e.to_string(),
            })?;
        debug!(url = %config.url(), status = %response.status(), "websocket handshake complete");
        Ok(socket_from_ws(ws))
    }
}

/// Build the upgrade request, carrying the secret as a bearer token.
pub fn handshake_request(config: &ConnectionConfig) -> Result<Request> {
    let handshake_err = |reason: String| ClientError::HandshakeFailed { reason };

    let mut request = config
        .url()
        .into_client_request()
        .map_err(|e| handshake_err(e.to_string()))?;
    let bearer = HeaderValue::from_str(&config.bearer())
        .map_err(|_| handshake_err("secret contains characters not allowed in a header".into()))?;
    let _ = request.headers_mut().insert(AUTHORIZATION, bearer);
    Ok(request)
}

/// Adapt a tungstenite stream to a text [`Socket`].
pub fn socket_from_ws<S>(ws: WebSocketStream<S>) -> Socket
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = ws.split();
    let sink = sink
        .with(|text: String| future::ready(Ok::<_, tungstenite::Error>(Message::Text(text.into()))))
        .sink_map_err(|e| ClientError::Transport {
            reason: e.to_string(),
        });
    let stream = stream.filter_map(|frame| future::ready(decode_frame(frame)));
    Socket {
        sink: Box::pin(sink),
        stream: Box::pin(stream),
    }
}

fn decode_frame(
    frame: std::result::Result<Message, tungstenite::Error>,
) -> Option<Result<String>> {
    match frame {
        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
        Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
            Ok(text) => Some(Ok(text.to_owned())),
            Err(e) => {
                warn!(len = bytes.len(), error = %e, "dropping non-UTF-8 binary frame");
                None
            }
        },
        Ok(Message::Close(frame)) => {
            debug!(?frame, "peer sent close frame");
            None
        }
        Ok(_) => None,
        Err(e) => Some(Err(ClientError::Transport {
            reason: e.to_string(),
        })),
    }
}

/// rustls needs a process-wide crypto provider before the first `wss://`
/// handshake.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

// ─── Transport connection ────────────────────────────────────────────────────

/// Lifecycle events surfaced by a [`TransportConnection`].
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// The I/O task is running.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The socket failed; a `Closed` event follows.
    Error(ClientError),
    /// The socket is gone. Not emitted after [`TransportConnection::close`].
    Closed,
}

/// Receives `(generation, event)` from the I/O task.
pub type EventHandler = Arc<dyn Fn(u64, TransportEvent) + Send + Sync>;

/// Owner of one socket and its I/O task.
pub struct TransportConnection {
    generation: u64,
    outbound: mpsc::UnboundedSender<String>,
    task: Option<JoinHandle<()>>,
}

impl TransportConnection {
    /// Start the I/O task for `socket`.
    pub fn spawn(generation: u64, socket: Socket, on_event: EventHandler) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(io_loop(generation, socket, outbound_rx, on_event));
        Self {
            generation,
            outbound,
            task: Some(task),
        }
    }

    /// Generation tag this connection reports events with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the I/O task is still running.
    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Queue a text frame for the peer.
    pub fn send(&self, text: String) -> Result<()> {
        if self.task.is_none() {
            return Err(ClientError::NotConnected);
        }
        self.outbound
            .send(text)
            .map_err(|_| ClientError::ConnectionClosed)
    }

    /// Abort the I/O task, dropping the socket. Idempotent.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "transport closed");
        }
    }
}

impl Drop for TransportConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pump outbound frames to the sink and inbound frames to the handler until
/// either side ends.
async fn io_loop(
    generation: u64,
    socket: Socket,
    mut outbound: mpsc::UnboundedReceiver<String>,
    on_event: EventHandler,
) {
    let Socket {
        mut sink,
        mut stream,
    } = socket;
    on_event(generation, TransportEvent::Open);

    loop {
        tokio::select! {
            text = outbound.recv() => {
                let Some(text) = text else { break };
                if let Err(e) = sink.send(text).await {
                    on_event(generation, TransportEvent::Error(e));
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(text)) => on_event(generation, TransportEvent::Message(text)),
                Some(Err(e)) => {
                    on_event(generation, TransportEvent::Error(e));
                    break;
                }
                None => break,
            }
        }
    }

    on_event(generation, TransportEvent::Closed);
}
