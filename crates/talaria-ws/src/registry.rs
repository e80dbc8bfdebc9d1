//! Live socket connection registry.

use dashmap::DashMap;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound channel for one connection.
pub type OutboundSender = mpsc::UnboundedSender<Value>;

struct Connection {
    sender: OutboundSender,
    handshake: IndexMap<String, String>,
}

/// Registry of live socket connections.
///
/// Each connection gets a time-ordered id at registration; the transport
/// keeps the receiving half of the outbound channel and writes whatever
/// arrives on it to the wire. Emits are fire-and-forget: pushing to a
/// connection that has gone away logs and drops the payload, it never
/// fails the caller.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Connection>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection, returning its assigned id.
    pub fn register(
        &self,
        handshake: IndexMap<String, String>,
        sender: OutboundSender,
    ) -> String {
        let id = Uuid::now_v7().to_string();
        self.connections
            .insert(id.clone(), Connection { sender, handshake });
        tracing::debug!(connection = %id, total = self.connections.len(), "socket connected");
        id
    }

    /// Removes a connection.
    pub fn unregister(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            tracing::debug!(
                connection = %connection_id,
                total = self.connections.len(),
                "socket disconnected"
            );
        }
    }

    /// The handshake data captured when the connection registered.
    #[must_use]
    pub fn handshake(&self, connection_id: &str) -> Option<IndexMap<String, String>> {
        self.connections
            .get(connection_id)
            .map(|c| c.handshake.clone())
    }

    /// Pushes a payload to one connection, fire-and-forget.
    pub fn emit(&self, connection_id: &str, payload: Value) {
        match self.connections.get(connection_id) {
            Some(connection) => {
                if connection.sender.send(payload).is_err() {
                    tracing::warn!(connection = %connection_id, "emit to closed connection dropped");
                }
            }
            None => {
                tracing::warn!(connection = %connection_id, "emit to unknown connection dropped");
            }
        }
    }

    /// Pushes a payload to every live connection.
    pub fn broadcast(&self, payload: &Value) {
        for entry in self.connections.iter() {
            if entry.value().sender.send(payload.clone()).is_err() {
                tracing::warn!(connection = %entry.key(), "broadcast to closed connection dropped");
            }
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
