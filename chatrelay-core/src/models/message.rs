use serde::{Deserialize, Serialize};

use crate::protocol::http::MessageRequest;
use crate::utils::now_local_timestamp;

/// Chat message appended to a room's history and broadcast on the room topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub content: String,
    pub sender: String,
    pub timestamp: String, // local date-time, no offset
}

impl Message {
    pub fn new(content: impl Into<String>, sender: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender: sender.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Builds the message for an inbound request, stamped with the server's current local time.
    pub fn from_request(request: &MessageRequest) -> Self {
        Self::new(request.content.clone(), request.sender.clone(), now_local_timestamp())
    }
}
