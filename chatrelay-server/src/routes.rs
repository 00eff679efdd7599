use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Extension, Router};
use chatrelay_core::protocol::destinations::{ROOM_TOPIC, SEND_MESSAGE};
use tower_http::cors::{Any, CorsLayer};

use crate::routing::DestinationRouter;
use crate::{controllers, ws, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(controllers::health))
        .route("/ws", get(ws::ws_handler))
        .route("/api/v1/rooms", post(controllers::create_room))
        .route("/api/v1/rooms/:room_id", get(controllers::get_room))
        .route("/api/v1/rooms/:room_id/messages", get(controllers::list_messages))
        .layer(Extension(state))
}

/// Inbound destinations handled over the socket.
pub fn destinations(prefix: &str) -> DestinationRouter {
    DestinationRouter::new(prefix).route(SEND_MESSAGE, ROOM_TOPIC, controllers::on_send_message)
}

/// CORS restricted to a single origin.
pub fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("parse allowed origin {origin:?}"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}
