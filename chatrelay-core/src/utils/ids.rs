use uuid::Uuid;

/// New WebSocket session id (UUIDv4) as a string.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
