// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay socket endpoint. Authentication happens in-band via the handshake
//! frame, not at the HTTP upgrade.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::relay::registry::ConnId;
use crate::state::AppState;

/// `GET /ws` — WebSocket upgrade for agents and panels.
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Per-connection reader loop. The writer runs as a sibling task draining
/// the connection's outbox.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let (id, outbox) = state.relay.open();
    let cancel = state.shutdown.child_token();
    let (ws_tx, mut ws_rx) = socket.split();

    let writer = tokio::spawn(write_loop(id, ws_tx, outbox, cancel.clone()));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        state.relay.handle_text(id, text.as_str());
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(conn = %id, err = %e, "socket read error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.relay.close(id);
    cancel.cancel();
    if let Err(e) = writer.await {
        tracing::debug!(conn = %id, err = %e, "writer task join failed");
    }
}

/// Drain queued frames into the socket until cancelled or the socket fails.
async fn write_loop(
    id: ConnId,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbox: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            frame = outbox.recv() => {
                let Some(frame) = frame else { break };
                if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                    tracing::debug!(conn = %id, "socket write failed");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
    let _ = ws_tx.close().await;
}
