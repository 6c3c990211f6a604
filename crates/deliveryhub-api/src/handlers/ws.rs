//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use deliveryhub_realtime::message::codec;

use crate::state::AppState;

/// GET /ws: WebSocket upgrade
///
/// The connection identity is assumed to be verified upstream; every socket
/// becomes one hub connection.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (conn_id, mut outbound_rx) = match state.hub.connect().await {
        Ok(registered) => registered,
        Err(e) => {
            warn!(error = %e, "Hub unavailable, dropping WebSocket");
            return;
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Outbound forwarder. Ends when the hub drops the connection handle.
    let mut outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match codec::encode_outbound(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!(conn_id = %conn_id, error = %e, "Failed to encode outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if state.hub.inbound(conn_id, text.as_str().to_owned()).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    debug!(conn_id = %conn_id, "Binary frame ignored");
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered by axum
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = &mut outbound_task => break,
        }
    }

    outbound_task.abort();
    if let Err(e) = state.hub.disconnect(conn_id).await {
        debug!(conn_id = %conn_id, error = %e, "Hub already stopped");
    }

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
