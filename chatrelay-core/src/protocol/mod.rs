pub mod destinations;
pub mod http;
pub mod ws;

pub use http::{CreateRoomRequest, ListMessagesResponse, MessageRequest, MessagesQuery};
pub use ws::{ClientFrame, Connected, Delivery, SendFrame, ServerFrame, Subscribe, Unsubscribe};
