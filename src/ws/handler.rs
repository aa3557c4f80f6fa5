//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::QueueError;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The client is registered with the hub before the upgrade completes, so
/// it receives every event published after the handshake.
///
/// # Errors
///
/// Returns [`QueueError::Internal`] if the hub has stopped.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<Response, QueueError> {
    let subscription = state
        .hub
        .subscribe()
        .await
        .map_err(|e| QueueError::Internal(e.to_string()))?;
    let heartbeat = state.heartbeat;

    Ok(ws
        .on_upgrade(move |socket| run_connection(socket, subscription, heartbeat))
        .into_response())
}
