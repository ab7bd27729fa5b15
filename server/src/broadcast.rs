use std::collections::{HashMap, HashSet};

use chipledger_protocol::{ConnectionId, ServerToClient};
use tokio::sync::mpsc;
use tracing::warn;

use crate::room::Room;

/// Outbound queue of one socket; a writer task drains it onto the wire.
pub type Outbox = mpsc::UnboundedSender<ServerToClient>;

/// Per-room subscriber groups. Every publish is a full snapshot.
#[derive(Debug, Default)]
pub struct BroadcastChannel {
    outboxes: HashMap<ConnectionId, Outbox>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl BroadcastChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: ConnectionId, outbox: Outbox) {
        self.outboxes.insert(connection, outbox);
    }

    /// Forget the connection. Returns the rooms it was subscribed to.
    pub fn unregister(&mut self, connection: ConnectionId) -> Vec<String> {
        self.outboxes.remove(&connection);
        let mut left = Vec::new();
        for (code, members) in self.groups.iter_mut() {
            if members.remove(&connection) {
                left.push(code.clone());
            }
        }
        self.groups.retain(|_, members| !members.is_empty());
        left
    }

    pub fn subscribe(&mut self, connection: ConnectionId, room_code: &str) {
        self.groups
            .entry(room_code.to_string())
            .or_default()
            .insert(connection);
    }

    pub fn drop_group(&mut self, room_code: &str) {
        self.groups.remove(room_code);
    }

    pub fn is_subscribed(&self, connection: ConnectionId, room_code: &str) -> bool {
        self.groups
            .get(room_code)
            .is_some_and(|members| members.contains(&connection))
    }

    pub fn send_to(&self, connection: ConnectionId, msg: ServerToClient) {
        if let Some(outbox) = self.outboxes.get(&connection) {
            if outbox.send(msg).is_err() {
                warn!(%connection, "outbox closed, message dropped");
            }
        }
    }

    /// Push the room's current state to everyone watching it.
    pub fn publish(&self, room: &Room) {
        let Some(members) = self.groups.get(&room.code) else {
            return;
        };
        let snapshot = Box::new(room.snapshot());
        for connection in members {
            self.send_to(*connection, ServerToClient::State(snapshot.clone()));
        }
    }
}
