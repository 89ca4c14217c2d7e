// Connection table and broadcaster: the shared map from live socket to
// {username, current pin} plus fan-out to every connection in a pin.
//
// Reader tasks run independently, one per connection; only the fields here
// are shared, and only while a message from that connection is being
// handled.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

pub type ConnId = u64;

struct ConnectionEntry {
    username: Option<String>,
    current_pin: Option<String>,
    outbox: mpsc::UnboundedSender<Value>,
}

#[derive(Default)]
pub struct ConnectionTable {
    connections: Mutex<HashMap<ConnId, ConnectionEntry>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: ConnId, outbox: mpsc::UnboundedSender<Value>) {
        self.connections.lock().await.insert(
            id,
            ConnectionEntry {
                username: None,
                current_pin: None,
                outbox,
            },
        );
    }

    pub async fn deregister(&self, id: ConnId) {
        self.connections.lock().await.remove(&id);
    }

    pub async fn username(&self, id: ConnId) -> Option<String> {
        self.connections.lock().await.get(&id)?.username.clone()
    }

    pub async fn set_username(&self, id: ConnId, username: String) {
        if let Some(entry) = self.connections.lock().await.get_mut(&id) {
            entry.username = Some(username);
        }
    }

    pub async fn current_pin(&self, id: ConnId) -> Option<String> {
        self.connections.lock().await.get(&id)?.current_pin.clone()
    }

    pub async fn set_current_pin(&self, id: ConnId, pin: Option<String>) {
        if let Some(entry) = self.connections.lock().await.get_mut(&id) {
            entry.current_pin = pin;
        }
    }

    /// Writes `msg` to a single connection's outbox. Best-effort: a closed
    /// outbox (peer gone) is logged and otherwise ignored.
    pub async fn send_to(&self, id: ConnId, msg: Value) {
        let connections = self.connections.lock().await;
        if let Some(entry) = connections.get(&id) {
            if entry.outbox.send(msg).is_err() {
                warn!(conn_id = id, "failed to queue frame, connection gone");
            }
        }
    }

    /// Fans `msg` out to every connection currently tagged with `pin`. A
    /// write failure on one connection never prevents delivery to others.
    pub async fn broadcast_to_pin(&self, pin: &str, msg: Value) {
        let connections = self.connections.lock().await;
        for (id, entry) in connections.iter() {
            if entry.current_pin.as_deref() == Some(pin) && entry.outbox.send(msg.clone()).is_err()
            {
                warn!(conn_id = id, pin, "failed to queue broadcast, connection gone");
            }
        }
    }
}
