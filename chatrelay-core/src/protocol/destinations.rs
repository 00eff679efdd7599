//! Address patterns shared by the server router and clients.

/// Inbound destination for chat messages; `{roomId}` is a path variable.
pub const SEND_MESSAGE: &str = "/sendMessage/{roomId}";

/// Per-room broadcast topic.
pub const ROOM_TOPIC: &str = "/topic/room/{roomId}";

/// Prefix clients usually put in front of application destinations.
pub const DEFAULT_APP_PREFIX: &str = "/app";

pub fn room_topic(room_id: &str) -> String {
    format!("/topic/room/{room_id}")
}
