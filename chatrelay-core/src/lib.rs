//! chatrelay-core: types shared by server and clients (models, HTTP DTOs, WS frames, errors).
//! No I/O here.

pub mod error;
pub mod models;
pub mod protocol;
pub mod utils;

pub use error::Error;
pub use models::{Message, Room};
pub use protocol::destinations::room_topic;
pub use protocol::http::{CreateRoomRequest, ListMessagesResponse, MessageRequest, MessagesQuery};
pub use protocol::ws::{ClientFrame, Connected, Delivery, SendFrame, ServerFrame, Subscribe, Unsubscribe};
pub use utils::{new_session_id, now_local, now_local_timestamp, parse_timestamp};
