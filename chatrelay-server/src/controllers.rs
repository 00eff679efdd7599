use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use chatrelay_core::{CreateRoomRequest, ListMessagesResponse, Message, MessageRequest, MessagesQuery, Room};

use crate::error::RelayError;
use crate::routing::PathVars;
use crate::AppState;

/// Appends the request's message to its room and returns it for broadcast.
///
/// The room is looked up by `request.room_id`, not by `room_id` from the destination;
/// the caller publishes on the destination's topic. With `strict_room_match` a
/// mismatch is rejected before any lookup.
pub async fn send_message(
    state: &AppState,
    room_id: &str,
    request: MessageRequest,
) -> Result<Message, RelayError> {
    if request.room_id != room_id {
        if state.strict_room_match {
            return Err(RelayError::RoomMismatch {
                path: room_id.to_string(),
                body: request.room_id,
            });
        }
        tracing::warn!(
            path_room = room_id,
            body_room = %request.room_id,
            "destination and body room ids differ; appending to body room"
        );
    }

    let mut room = state
        .store
        .find_by_room_id(&request.room_id)
        .await?
        .ok_or_else(|| RelayError::RoomNotFound(request.room_id.clone()))?;

    let message = Message::from_request(&request);
    room.push(message.clone());
    state.store.save(room).await?;

    tracing::info!(room = %request.room_id, sender = %message.sender, "message stored");
    Ok(message)
}

/// Route adapter for `/sendMessage/{roomId}`.
pub async fn on_send_message(
    state: Arc<AppState>,
    vars: PathVars,
    request: MessageRequest,
) -> Result<Message, RelayError> {
    let room_id = vars.get("roomId").map(String::as_str).unwrap_or_default();
    send_message(&state, room_id, request).await
}

/// Handler for POST /api/v1/rooms
pub async fn create_room(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Room>), RelayError> {
    let Json(req) = payload?;
    let room_id = req.room_id.trim();
    if room_id.is_empty() || room_id.contains('/') {
        return Err(RelayError::InvalidRoomId);
    }

    let room = state
        .store
        .create(room_id)
        .await?
        .ok_or_else(|| RelayError::RoomExists(room_id.to_string()))?;
    tracing::info!(room = %room.room_id, "room created");
    Ok((StatusCode::CREATED, Json(room)))
}

/// Handler for GET /api/v1/rooms/:room_id
pub async fn get_room(
    Extension(state): Extension<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, RelayError> {
    let room = state
        .store
        .find_by_room_id(&room_id)
        .await?
        .ok_or_else(|| RelayError::RoomNotFound(room_id.clone()))?;
    Ok(Json(room))
}

/// Handler for GET /api/v1/rooms/:room_id/messages?page=&size=
pub async fn list_messages(
    Extension(state): Extension<Arc<AppState>>,
    Path(room_id): Path<String>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Json<ListMessagesResponse>, RelayError> {
    let Query(query) = query?;
    let room = state
        .store
        .find_by_room_id(&room_id)
        .await?
        .ok_or_else(|| RelayError::RoomNotFound(room_id.clone()))?;
    let messages = room.page(query.page, query.size).to_vec();
    Ok(Json(ListMessagesResponse { messages }))
}

/// Handler for GET /health
pub async fn health(Extension(state): Extension<Arc<AppState>>) -> StatusCode {
    match state.store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("health check failed: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
