use serde::{Deserialize, Serialize};

use super::Message;

/// Named chat channel with its ordered history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Room {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Page `page` of `size` messages counted from the newest end, oldest first.
    /// A page past the start of history is empty.
    pub fn page(&self, page: usize, size: usize) -> &[Message] {
        let total = self.messages.len();
        let skip = match page.checked_mul(size) {
            Some(skip) if skip < total => skip,
            _ => return &[],
        };
        let end = total - skip;
        let start = end.saturating_sub(size);
        &self.messages[start..end]
    }
}
