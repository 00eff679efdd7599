/* Frames exchanged over the WebSocket.
    ClientFrame: what a client may send (subscribe / unsubscribe / send).
    ServerFrame: what the server pushes back (connected / message / error).
    Both use the { type, payload } envelope.
*/
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Client → Server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientFrame {
    #[serde(rename = "subscribe")]
    Subscribe(Subscribe),
    #[serde(rename = "unsubscribe")]
    Unsubscribe(Unsubscribe),
    /// Body is routed by destination; its shape depends on the handler.
    #[serde(rename = "send")]
    Send(SendFrame),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribe {
    /// Client-chosen id, unique within the session.
    pub id: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unsubscribe {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFrame {
    pub destination: String,
    #[serde(default)]
    pub body: Value,
}

/// Server → Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerFrame {
    #[serde(rename = "connected")]
    Connected(Connected),
    /// A value published on a topic the session subscribed to.
    #[serde(rename = "message")]
    Message(Delivery),
    /// Failure of a frame sent by this session; never broadcast.
    #[serde(rename = "error")]
    Error(Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub destination: String,
    /// Id of the subscription this delivery matched.
    pub subscription: String,
    pub body: Value,
}
