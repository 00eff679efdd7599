use std::sync::Arc;

use chatrelay_server::config::Config;
use chatrelay_server::store::RoomStore;
use chatrelay_server::ws::handle_client_text;
use chatrelay_server::AppState;
use serde_json::{json, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

struct Client {
    id: &'static str,
    tx: UnboundedSender<String>,
    rx: UnboundedReceiver<String>,
}

impl Client {
    fn new(id: &'static str) -> Self {
        let (tx, rx) = unbounded_channel();
        Self { id, tx, rx }
    }

    async fn send(&self, state: &Arc<AppState>, frame: Value) {
        handle_client_text(state, self.id, &self.tx, &frame.to_string()).await;
    }

    async fn send_raw(&self, state: &Arc<AppState>, text: &str) {
        handle_client_text(state, self.id, &self.tx, text).await;
    }

    fn next(&mut self) -> Option<Value> {
        self.rx
            .try_recv()
            .ok()
            .map(|text| serde_json::from_str(&text).expect("server frames are json"))
    }
}

fn subscribe(id: &str, destination: &str) -> Value {
    json!({ "type": "subscribe", "payload": { "id": id, "destination": destination } })
}

fn send(destination: &str, room_id: &str, content: &str, sender: &str) -> Value {
    json!({
        "type": "send",
        "payload": {
            "destination": destination,
            "body": { "roomId": room_id, "content": content, "sender": sender }
        }
    })
}

fn state_with(rooms: &[&'static str]) -> Arc<AppState> {
    Arc::new(AppState::in_memory(rooms.iter().copied(), &Config::default()))
}

#[tokio::test]
async fn send_is_broadcast_to_every_room_subscriber_including_sender() {
    let state = state_with(&["room-42"]);
    let mut alice = Client::new("alice-session");
    let mut bob = Client::new("bob-session");

    alice.send(&state, subscribe("sub-0", "/topic/room/room-42")).await;
    bob.send(&state, subscribe("sub-7", "/topic/room/room-42")).await;

    alice.send(&state, send("/app/sendMessage/room-42", "room-42", "hi", "alice")).await;

    let to_alice = alice.next().expect("alice gets her own message");
    assert_eq!(to_alice["type"], "message");
    assert_eq!(to_alice["payload"]["subscription"], "sub-0");
    assert_eq!(to_alice["payload"]["body"]["content"], "hi");
    assert_eq!(to_alice["payload"]["body"]["sender"], "alice");

    let to_bob = bob.next().expect("bob gets the broadcast");
    assert_eq!(to_bob["payload"]["subscription"], "sub-7");
    assert_eq!(to_bob["payload"]["body"], to_alice["payload"]["body"]);

    assert!(alice.next().is_none());
    assert!(bob.next().is_none());
}

#[tokio::test]
async fn missing_room_errors_only_to_sender_and_broadcasts_nothing() {
    let state = state_with(&["room-42"]);
    let mut alice = Client::new("a");
    let mut bob = Client::new("b");
    bob.send(&state, subscribe("s", "/topic/room/ghost")).await;

    alice.send(&state, send("/app/sendMessage/ghost", "ghost", "x", "bob")).await;

    let err = alice.next().expect("error frame");
    assert_eq!(err["type"], "error");
    assert_eq!(err["payload"]["code"], "room_not_found");
    assert_eq!(err["payload"]["details"]["roomId"], "ghost");
    assert!(bob.next().is_none(), "nothing may be broadcast for a missing room");
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let state = state_with(&["r1"]);
    let mut alice = Client::new("a");

    alice.send(&state, subscribe("s", "/topic/room/r1")).await;
    alice
        .send(&state, json!({ "type": "unsubscribe", "payload": { "id": "s" } }))
        .await;
    alice.send(&state, send("/sendMessage/r1", "r1", "quiet", "alice")).await;

    assert!(alice.next().is_none());
    // the message is still stored
    let room = state.store.find_by_room_id("r1").await.unwrap().expect("room");
    assert_eq!(room.messages.len(), 1);
}

#[tokio::test]
async fn malformed_and_unroutable_frames_get_error_frames() {
    let state = state_with(&["r1"]);
    let mut alice = Client::new("a");

    alice.send_raw(&state, "not json").await;
    assert_eq!(alice.next().expect("error")["payload"]["code"], "invalid_frame");

    alice
        .send(&state, json!({ "type": "send", "payload": { "destination": "/app/nowhere", "body": {} } }))
        .await;
    let err = alice.next().expect("error");
    assert_eq!(err["payload"]["code"], "unknown_destination");
    assert_eq!(err["payload"]["details"]["destination"], "/app/nowhere");

    alice
        .send(&state, json!({ "type": "send", "payload": { "destination": "/app/sendMessage/r1", "body": { "content": 1 } } }))
        .await;
    assert_eq!(alice.next().expect("error")["payload"]["code"], "invalid_payload");
}

#[tokio::test]
async fn closed_session_is_removed_from_topics() {
    let state = state_with(&["r1"]);
    let alice = Client::new("a");
    alice.send(&state, subscribe("s", "/topic/room/r1")).await;
    assert_eq!(state.broker.subscriber_count("/topic/room/r1"), 1);

    state.broker.remove_session("a");
    assert_eq!(state.broker.subscriber_count("/topic/room/r1"), 0);
}
