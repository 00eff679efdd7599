use chatrelay_core::*;
use serde_json::{self as json, Value};

fn parse(json_str: &str) -> Value {
    json::from_str(json_str).expect("valid json")
}

/*
    MessageRequest arrives as the body of a send frame with camelCase fields.
*/
#[test]
fn message_request_uses_camel_case() {
    let req: MessageRequest =
        json::from_str(r#"{"roomId":"room-42","content":"hi","sender":"alice"}"#).expect("deserialize");
    assert_eq!(req.room_id, "room-42");
    assert_eq!(req.content, "hi");
    assert_eq!(req.sender, "alice");

    let v = parse(&json::to_string(&req).expect("serialize"));
    assert_eq!(v["roomId"], "room-42");
    assert!(v.get("room_id").is_none());
}

/*
    The broadcast payload carries exactly content, sender and timestamp.
*/
#[test]
fn message_payload_shape() {
    let m = Message::new("hi", "alice", "2025-11-02T10:20:35.000000000");
    let v = parse(&json::to_string(&m).expect("serialize"));

    let obj = v.as_object().expect("object");
    assert_eq!(obj.len(), 3);
    assert_eq!(v["content"], "hi");
    assert_eq!(v["sender"], "alice");
    assert_eq!(v["timestamp"], "2025-11-02T10:20:35.000000000");
}

#[test]
fn message_from_request_copies_fields_and_stamps_now() {
    let req = MessageRequest {
        room_id: "room-42".to_string(),
        content: "hi".to_string(),
        sender: "alice".to_string(),
    };
    let before = now_local();
    let m = Message::from_request(&req);
    let after = now_local();

    assert_eq!(m.content, "hi");
    assert_eq!(m.sender, "alice");
    let ts = parse_timestamp(&m.timestamp).expect("timestamp parses");
    assert!(before <= ts && ts <= after, "timestamp {ts} outside [{before}, {after}]");
}

#[test]
fn room_without_messages_field_deserializes_empty() {
    let room: Room = json::from_str(r#"{"roomId":"r1"}"#).expect("deserialize");
    assert_eq!(room, Room::new("r1"));

    let v = parse(&json::to_string(&room).expect("serialize"));
    assert_eq!(v["roomId"], "r1");
    assert_eq!(v["messages"], serde_json::json!([]));
}

/*
    Client frames use the { type, payload } envelope.
*/
#[test]
fn client_send_frame_keeps_body_opaque() {
    let raw = r#"{"type":"send","payload":{"destination":"/app/sendMessage/r1","body":{"roomId":"r1","content":"x","sender":"bob"}}}"#;
    let frame: ClientFrame = json::from_str(raw).expect("deserialize");
    match frame {
        ClientFrame::Send(SendFrame { destination, body }) => {
            assert_eq!(destination, "/app/sendMessage/r1");
            let req: MessageRequest = json::from_value(body).expect("body is a MessageRequest");
            assert_eq!(req.sender, "bob");
        }
        other => panic!("expected Send, got {other:?}"),
    }
}

#[test]
fn client_subscribe_and_unsubscribe_frames() {
    let sub: ClientFrame =
        json::from_str(r#"{"type":"subscribe","payload":{"id":"sub-0","destination":"/topic/room/r1"}}"#)
            .expect("deserialize");
    assert_eq!(
        sub,
        ClientFrame::Subscribe(Subscribe { id: "sub-0".to_string(), destination: room_topic("r1") })
    );

    let unsub: ClientFrame =
        json::from_str(r#"{"type":"unsubscribe","payload":{"id":"sub-0"}}"#).expect("deserialize");
    assert_eq!(unsub, ClientFrame::Unsubscribe(Unsubscribe { id: "sub-0".to_string() }));
}

#[test]
fn unknown_frame_type_is_rejected() {
    let res = json::from_str::<ClientFrame>(r#"{"type":"connect","payload":{}}"#);
    assert!(res.is_err());
}

#[test]
fn server_message_frame_shape() {
    let m = Message::new("hi", "alice", "2025-11-02T10:20:35.000000000");
    let frame = ServerFrame::Message(Delivery {
        destination: room_topic("room-42"),
        subscription: "sub-0".to_string(),
        body: json::to_value(&m).expect("to value"),
    });
    let v = parse(&json::to_string(&frame).expect("serialize"));

    assert_eq!(v["type"], "message");
    assert_eq!(v["payload"]["destination"], "/topic/room/room-42");
    assert_eq!(v["payload"]["subscription"], "sub-0");
    assert_eq!(v["payload"]["body"]["sender"], "alice");
}

/*
    Error frames omit details when absent.
*/
#[test]
fn server_error_frame_omits_missing_details() {
    let frame = ServerFrame::Error(Error::new("room_not_found", "room not found: ghost"));
    let v = parse(&json::to_string(&frame).expect("serialize"));

    assert_eq!(v["type"], "error");
    assert_eq!(v["payload"]["code"], "room_not_found");
    assert!(v["payload"].get("details").is_none());

    let with = Error::new("room_not_found", "room not found: ghost").with_details(serde_json::json!({"roomId": "ghost"}));
    let v = parse(&json::to_string(&with).expect("serialize"));
    assert_eq!(v["details"]["roomId"], "ghost");
}

#[test]
fn connected_frame_carries_session_id() {
    let id = new_session_id();
    let frame = ServerFrame::Connected(Connected { session_id: id.clone() });
    let v = parse(&json::to_string(&frame).expect("serialize"));
    assert_eq!(v["type"], "connected");
    assert_eq!(v["payload"]["sessionId"], id);
}

#[test]
fn messages_query_defaults() {
    let q: MessagesQuery = json::from_str("{}").expect("deserialize");
    assert_eq!(q, MessagesQuery::default());
    assert_eq!(q.size, 20);
}
