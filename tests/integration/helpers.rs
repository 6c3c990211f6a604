//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use deliveryhub_api::{AppState, build_app};
use deliveryhub_core::config::AppConfig;
use deliveryhub_realtime::{HubSnapshot, RealtimeHub};

const WAIT: Duration = Duration::from_secs(2);

/// A running server on an ephemeral port
pub struct TestServer {
    /// Bound address
    pub addr: SocketAddr,
    /// State shared with the running server (same hub)
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

/// Response captured from a test request
pub struct TestResponse {
    /// HTTP status
    pub status: StatusCode,
    /// Parsed JSON body (`Null` when empty or not JSON)
    pub body: Value,
}

impl TestServer {
    /// Starts a server with default configuration
    pub async fn start() -> Self {
        Self::start_with(AppConfig::default()).await
    }

    /// Starts a server with the given configuration
    pub async fn start_with(config: AppConfig) -> Self {
        let (hub, _hub_task) = RealtimeHub::spawn(config.realtime.clone());
        let state = AppState::new(config, hub);
        let app = build_app(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Opens a WebSocket client against `/ws`
    pub async fn ws(&self) -> WsClient {
        WsClient::connect(self.addr).await
    }

    /// Makes an HTTP request against the router backed by the same hub
    pub async fn request(&self, method: &str, path: &str, body: Option<&str>) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .expect("request");

        let response = build_app(self.state.clone())
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Current hub snapshot
    pub async fn snapshot(&self) -> HubSnapshot {
        self.state.hub.snapshot().await.expect("hub snapshot")
    }

    /// Polls the hub until `done` holds, panicking after a timeout
    pub async fn wait_until<F>(&self, what: &str, done: F) -> HubSnapshot
    where
        F: Fn(&HubSnapshot) -> bool,
    {
        let deadline = tokio::time::Instant::now() + WAIT;
        loop {
            let snapshot = self.snapshot().await;
            if done(&snapshot) {
                return snapshot;
            }
            if tokio::time::Instant::now() >= deadline {
                panic!("timed out waiting for {what}: {snapshot:?}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Waits until the hub has processed `count` inbound messages
    pub async fn wait_for_messages(&self, count: u64) -> HubSnapshot {
        self.wait_until("inbound messages", |s| s.metrics.messages_received >= count)
            .await
    }

    /// Stops the HTTP server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Thin WebSocket client speaking the hub's JSON envelope
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connects to `ws://{addr}/ws`
    pub async fn connect(addr: SocketAddr) -> Self {
        let (stream, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("WebSocket connect");
        Self { stream }
    }

    /// Sends `{"event": event, "data": data}`
    pub async fn send_event(&mut self, event: &str, data: Value) {
        let envelope = serde_json::json!({ "event": event, "data": data });
        self.send_raw(&envelope.to_string()).await;
    }

    /// Sends a raw text frame
    pub async fn send_raw(&mut self, raw: &str) {
        self.stream
            .send(Message::Text(raw.to_string().into()))
            .await
            .expect("send frame");
    }

    /// Receives the next JSON text frame
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(WAIT, self.stream.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("frame error");
            match frame {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("JSON frame");
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Asserts nothing arrives for `wait`
    pub async fn expect_silence(&mut self, wait: Duration) {
        if let Ok(Some(Ok(frame))) = tokio::time::timeout(wait, self.stream.next()).await {
            panic!("expected no frame, got {frame:?}");
        }
    }

    /// Waits until the server closes the socket
    pub async fn expect_closed(&mut self) {
        loop {
            match tokio::time::timeout(WAIT, self.stream.next())
                .await
                .expect("timed out waiting for close")
            {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Closes the socket
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
