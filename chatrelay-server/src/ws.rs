use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, WebSocketUpgrade};
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chatrelay_core::{new_session_id, ClientFrame, Connected, SendFrame, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::broker::Outbound;
use crate::error::RelayError;
use crate::AppState;

/// Handler for GET /ws
///
/// CORS does not apply to WebSocket handshakes, so the origin is checked here.
/// Requests without an `Origin` header (non-browser clients) are let through.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if let Some(origin) = headers.get(ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !origin_allowed(origin, &state.allowed_origin) {
            tracing::warn!(origin, "websocket upgrade from foreign origin rejected");
            return StatusCode::FORBIDDEN.into_response();
        }
    }
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => rejection.into_response(),
    }
}

pub fn origin_allowed(origin: &str, allowed: &str) -> bool {
    !origin.is_empty() && origin.trim_end_matches('/').eq_ignore_ascii_case(allowed)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = new_session_id();

    // Every frame for this client, whether a reply or a broadcast, goes through `tx`;
    // the broker keeps clones of it for each subscription.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (mut sender, mut receiver) = socket.split();

    let forward_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    send_frame(
        &tx,
        &ServerFrame::Connected(Connected {
            session_id: session_id.clone(),
        }),
    );
    tracing::info!(session = %session_id, "websocket session opened");

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => handle_client_text(&state, &session_id, &tx, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    // cleanup: once the broker lets go of its clones the forward task drains and ends
    state.broker.remove_session(&session_id);
    drop(tx);
    let _ = forward_task.await;
    tracing::info!(session = %session_id, "websocket session closed");
}

/// Applies one text frame from a client session.
///
/// Failures are reported to this session only, as an `error` frame.
pub async fn handle_client_text(state: &Arc<AppState>, session_id: &str, tx: &Outbound, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            report(session_id, tx, RelayError::InvalidFrame(e));
            return;
        }
    };

    match frame {
        ClientFrame::Subscribe(sub) => {
            state.broker.subscribe(&sub.destination, session_id, &sub.id, tx.clone());
        }
        ClientFrame::Unsubscribe(unsub) => {
            state.broker.unsubscribe(session_id, &unsub.id);
        }
        ClientFrame::Send(SendFrame { destination, body }) => {
            match state.router.dispatch(Arc::clone(state), &destination, body).await {
                Ok(dispatched) => {
                    let delivered = state.broker.publish(&dispatched.topic, &dispatched.payload);
                    tracing::debug!(session = session_id, topic = %dispatched.topic, delivered, "broadcast");
                }
                Err(e) => report(session_id, tx, e),
            }
        }
    }
}

fn report(session_id: &str, tx: &Outbound, err: RelayError) {
    if err.is_internal() {
        tracing::error!(session = session_id, "frame failed: {err}");
    } else {
        tracing::warn!(session = session_id, code = err.code(), "frame rejected: {err}");
    }
    send_frame(tx, &ServerFrame::Error(err.to_wire()));
}

fn send_frame(tx: &Outbound, frame: &ServerFrame) {
    match serde_json::to_string(frame) {
        // a closed channel means the socket is already going away
        Ok(text) => {
            let _ = tx.send(text);
        }
        Err(e) => tracing::error!("failed to encode server frame: {e}"),
    }
}
