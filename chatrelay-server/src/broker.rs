use chatrelay_core::{Delivery, ServerFrame};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

/// Outbound half of a WebSocket session: serialized server frames.
pub type Outbound = UnboundedSender<String>;

struct Subscriber {
    session_id: String,
    subscription_id: String,
    tx: Outbound,
}

/// Topic registry: topic string -> current subscribers.
#[derive(Default)]
pub struct Broker {
    topics: DashMap<String, Vec<Subscriber>>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscription_id` of `session_id` on `topic`. Reusing an id moves it.
    pub fn subscribe(&self, topic: &str, session_id: &str, subscription_id: &str, tx: Outbound) {
        self.unsubscribe(session_id, subscription_id);
        self.topics.entry(topic.to_string()).or_default().push(Subscriber {
            session_id: session_id.to_string(),
            subscription_id: subscription_id.to_string(),
            tx,
        });
        tracing::debug!(topic, session = session_id, subscription = subscription_id, "subscribed");
    }

    pub fn unsubscribe(&self, session_id: &str, subscription_id: &str) {
        self.remove_where(|s| s.session_id == session_id && s.subscription_id == subscription_id);
    }

    /// Drops every subscription held by a session; called when its socket closes.
    pub fn remove_session(&self, session_id: &str) {
        self.remove_where(|s| s.session_id == session_id);
    }

    /// Hands `body` to every subscriber of `topic` and returns how many accepted it.
    /// Subscribers whose session has gone away are pruned.
    pub fn publish(&self, topic: &str, body: &Value) -> usize {
        let mut delivered = 0;
        let emptied = {
            let Some(mut subscribers) = self.topics.get_mut(topic) else {
                return 0;
            };
            subscribers.retain(|s| {
                let frame = ServerFrame::Message(Delivery {
                    destination: topic.to_string(),
                    subscription: s.subscription_id.clone(),
                    body: body.clone(),
                });
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(topic, "failed to encode delivery: {e}");
                        return true;
                    }
                };
                if s.tx.send(text).is_ok() {
                    delivered += 1;
                    true
                } else {
                    false
                }
            });
            subscribers.is_empty()
        };
        if emptied {
            self.topics.remove_if(topic, |_, subs| subs.is_empty());
        }
        delivered
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|subs| subs.len()).unwrap_or(0)
    }

    fn remove_where(&self, pred: impl Fn(&Subscriber) -> bool) {
        for mut entry in self.topics.iter_mut() {
            entry.value_mut().retain(|s| !pred(s));
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }
}
