use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("room not found: {0}")]
    RoomNotFound(String),

    #[error("destination room {path} does not match body room {body}")]
    RoomMismatch { path: String, body: String },

    #[error("room already exists: {0}")]
    RoomExists(String),

    #[error("room id must not be blank")]
    InvalidRoomId,

    #[error("no handler for destination {0}")]
    UnknownDestination(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryRejection),

    #[error("invalid frame: {0}")]
    InvalidFrame(#[source] serde_json::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RelayError {
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::RoomNotFound(_) => "room_not_found",
            RelayError::RoomMismatch { .. } => "room_mismatch",
            RelayError::RoomExists(_) => "room_exists",
            RelayError::InvalidRoomId => "invalid_room_id",
            RelayError::UnknownDestination(_) => "unknown_destination",
            RelayError::InvalidPayload(_) | RelayError::InvalidBody(_) | RelayError::InvalidQuery(_) => {
                "invalid_payload"
            }
            RelayError::InvalidFrame(_) => "invalid_frame",
            RelayError::Encode(_) | RelayError::Store(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::RoomNotFound(_) | RelayError::UnknownDestination(_) => StatusCode::NOT_FOUND,
            RelayError::RoomExists(_) => StatusCode::CONFLICT,
            RelayError::RoomMismatch { .. }
            | RelayError::InvalidRoomId
            | RelayError::InvalidPayload(_)
            | RelayError::InvalidBody(_)
            | RelayError::InvalidQuery(_)
            | RelayError::InvalidFrame(_) => StatusCode::BAD_REQUEST,
            RelayError::Encode(_) | RelayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side failures, as opposed to bad input from the client.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn to_wire(&self) -> chatrelay_core::Error {
        let err = chatrelay_core::Error::new(self.code(), self.to_string());
        match self {
            RelayError::RoomNotFound(id) | RelayError::RoomExists(id) => err.with_details(json!({ "roomId": id })),
            RelayError::RoomMismatch { path, body } => err.with_details(json!({ "path": path, "body": body })),
            RelayError::UnknownDestination(dest) => err.with_details(json!({ "destination": dest })),
            _ => err,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("request failed: {self}");
        }
        (self.status(), Json(self.to_wire())).into_response()
    }
}
