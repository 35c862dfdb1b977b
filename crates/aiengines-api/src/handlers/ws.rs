//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use aiengines_realtime::connection::{AuthenticatedConnection, ConnectionSession};

use crate::extractors::VerifiedUser;
use crate::state::AppState;

/// GET /ws: WebSocket upgrade. The token is verified before upgrading.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    VerifiedUser(auth): VerifiedUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, auth, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, auth: AuthenticatedConnection, mut socket: WebSocket) {
    let hub = state.realtime.hub.clone();
    let (mut session, mut outbound) = match ConnectionSession::open(hub, auth.user_id.clone()).await {
        Ok(opened) => opened,
        Err(e) => {
            warn!(user_id = %auth.user_id, error = %e, "Rejecting WebSocket connection");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let conn_id = session.id();
    let closed = session.handle().closed_token();
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!(conn_id = %conn_id, user_id = %auth.user_id, "WebSocket connection established");

    // Outbound forwarder: drains the bounded queue into the socket.
    let writer_closed = closed.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = writer_closed.cancelled() => break,
                frame = outbound.recv() => {
                    let Some(frame) = frame else { break };
                    if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                        debug!(conn_id = %conn_id, error = %e, "WebSocket write failed");
                        writer_closed.cancel();
                        break;
                    }
                }
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    // Inbound frames are handled strictly in arrival order.
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    session.handle_frame(text.as_str()).await;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes);
                    session.handle_frame(&text).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/Pong are answered by axum.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn_id = %conn_id, error = %e, "WebSocket read failed");
                    break;
                }
            }
        }
    }

    session.close().await;
    if let Err(e) = writer.await {
        warn!(conn_id = %conn_id, error = %e, "Outbound forwarder ended abnormally");
    }

    info!(conn_id = %conn_id, user_id = %auth.user_id, "WebSocket connection closed");
}
