//! End-to-end tests against a real WebSocket server on loopback.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use futures::{SinkExt, StreamExt};
use mmsp_client::{ClientOptions, MmspClient};
use mmsp_core::types::Player;
use mmsp_core::{ClientError, ConnectionConfig, ConnectionState, ConnectionStatus};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

const TIMEOUT: Duration = Duration::from_secs(5);
const SECRET: &str = "letmein";

type ServerSocket = WebSocketStream<TcpStream>;

/// Bind a loopback server that checks the bearer secret and hands each
/// accepted socket to `handler`. Returns the bound port.
async fn boot_server<F, Fut>(handler: F) -> u16
where
    F: Fn(ServerSocket) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handler = Arc::new(handler);

    drop(tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            drop(tokio::spawn(async move {
                if let Ok(ws) = accept_hdr_async(stream, check_secret).await {
                    handler(ws).await;
                }
            }));
        }
    }));
    port
}

fn check_secret(request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    let expected = format!("Bearer {SECRET}");
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if authorized {
        return Ok(response);
    }
    let mut rejection = ErrorResponse::new(Some("invalid secret".into()));
    *rejection.status_mut() = StatusCode::UNAUTHORIZED;
    Err(rejection)
}

/// Answer every call with one player.
async fn answer_players(mut ws: ServerSocket) {
    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else { continue };
        let call: Value = serde_json::from_str(text.as_str()).unwrap();
        let reply = json!({
            "jsonrpc": "2.0",
            "id": call["id"],
            "result": [{"id": "abc", "name": "Steve"}],
        });
        if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
            break;
        }
    }
}

/// Push one `server/saved` notification, then idle until the client leaves.
async fn push_saved(mut ws: ServerSocket) {
    let note = json!({"jsonrpc": "2.0", "method": "notification:server/saved", "params": {}});
    ws.send(Message::Text(note.to_string().into())).await.unwrap();
    while let Some(Ok(_)) = ws.next().await {}
}

fn config(port: u16, secret: &str) -> ConnectionConfig {
    ConnectionConfig::new("127.0.0.1", port, secret)
}

fn state_feed(client: &MmspClient) -> mpsc::UnboundedReceiver<ConnectionState> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = client.on_state_change(move |state| {
        let _ = tx.send(state.clone());
    });
    rx
}

async fn wait_for(
    feed: &mut mpsc::UnboundedReceiver<ConnectionState>,
    status: ConnectionStatus,
) -> ConnectionState {
    timeout(TIMEOUT, async {
        loop {
            let state = feed.recv().await.unwrap();
            if state.status == status {
                return state;
            }
        }
    })
    .await
    .expect("timed out waiting for state")
}

#[tokio::test]
async fn players_list_resolves_to_typed_players() {
    let port = boot_server(answer_players).await;
    let client = MmspClient::new();
    client.connect(config(port, SECRET)).await.unwrap();

    let players = timeout(TIMEOUT, client.players()).await.unwrap().unwrap();
    assert_eq!(
        players,
        [Player {
            id: "abc".into(),
            name: "Steve".into()
        }]
    );
    client.disconnect();
}

#[tokio::test]
async fn notification_delivered_exactly_once() {
    let port = boot_server(push_saved).await;
    let client = MmspClient::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = client.on_notification(move |n| {
        let _ = tx.send((n.topic.clone(), n.params.clone()));
    });

    client.connect(config(port, SECRET)).await.unwrap();

    let (topic, params) = timeout(TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(topic, "server/saved");
    assert_eq!(params, json!({}));
    assert!(
        timeout(Duration::from_millis(200), rx.recv()).await.is_err(),
        "notification delivered twice"
    );
    client.disconnect();
}

#[tokio::test]
async fn wrong_secret_fails_handshake() {
    let port = boot_server(answer_players).await;
    let client = MmspClient::new();

    let err = client.connect(config(port, "nope")).await.unwrap_err();
    assert_matches!(err, ClientError::HandshakeFailed { reason } if reason.contains("401"));

    let state = client.connection_state();
    assert_eq!(state.status, ConnectionStatus::Disconnected);
    assert!(state.error.is_some_and(|e| e.contains("401")));
    assert_eq!(
        client.players().await,
        Err(ClientError::NotConnected)
    );
}

#[tokio::test]
async fn server_close_triggers_reconnect() {
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    let port = boot_server(move |mut ws: ServerSocket| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                let _ = ws.close(None).await;
            } else {
                while let Some(Ok(_)) = ws.next().await {}
            }
        }
    })
    .await;

    let client = MmspClient::with_options(ClientOptions {
        reconnect_delay: Duration::from_millis(100),
        ..ClientOptions::default()
    });
    let mut feed = state_feed(&client);
    client.connect(config(port, SECRET)).await.unwrap();

    let _ = wait_for(&mut feed, ConnectionStatus::Connected).await;
    let dropped = wait_for(&mut feed, ConnectionStatus::Disconnected).await;
    assert!(dropped.error.is_some());
    let _ = wait_for(&mut feed, ConnectionStatus::Connected).await;

    assert_eq!(accepted.load(Ordering::SeqCst), 2);
    client.disconnect();
}
