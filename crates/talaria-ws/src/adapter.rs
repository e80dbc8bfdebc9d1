//! Socket event adapter.
//!
//! Lifts raw socket lifecycle events into normalized request envelopes.
//! The well-known fields (language key, encryption flag, access token) are
//! looked up first in the message payload's top-level keys, then in the
//! handshake data captured when the connection registered.

use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;

use talaria_core::{
    flag_asserted, Body, Envelope, EventKind, ENCRYPTION_FIELD, LANGUAGE_FIELD, TOKEN_FIELD,
};

use crate::registry::ConnectionRegistry;

/// A raw socket lifecycle event, as the transport sees it.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// A peer connected; carries the handshake query data.
    Connect {
        /// The registry-assigned connection id.
        connection_id: String,
        /// Query parameters from the handshake request.
        handshake: IndexMap<String, String>,
    },
    /// A peer sent a named message.
    Message {
        /// The registry-assigned connection id.
        connection_id: String,
        /// The message event name, used as the method name.
        event: String,
        /// The message payload.
        payload: Value,
    },
    /// A peer disconnected.
    Disconnect {
        /// The registry-assigned connection id.
        connection_id: String,
    },
}

/// Normalizes socket events into dispatchable envelopes.
pub struct SocketAdapter {
    registry: Arc<ConnectionRegistry>,
    connect_route: String,
    disconnect_route: String,
}

impl SocketAdapter {
    /// Creates an adapter with the default lifecycle routes
    /// (`socket/connect`, `socket/disconnect`).
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            connect_route: "socket/connect".to_string(),
            disconnect_route: "socket/disconnect".to_string(),
        }
    }

    /// Overrides the method name dispatched on connect.
    #[must_use]
    pub fn with_connect_route(mut self, route: impl Into<String>) -> Self {
        self.connect_route = route.into();
        self
    }

    /// Overrides the method name dispatched on disconnect.
    #[must_use]
    pub fn with_disconnect_route(mut self, route: impl Into<String>) -> Self {
        self.disconnect_route = route.into();
        self
    }

    /// Normalizes one socket event into an envelope.
    ///
    /// Socket traffic always dispatches as `POST`; handlers exposed to
    /// sockets declare that verb.
    #[must_use]
    pub fn envelope(&self, event: SocketEvent) -> Envelope {
        match event {
            SocketEvent::Connect {
                connection_id,
                handshake,
            } => self.lifecycle_envelope(
                EventKind::Connect,
                &self.connect_route,
                connection_id,
                &handshake,
            ),
            SocketEvent::Disconnect { connection_id } => {
                let handshake = self
                    .registry
                    .handshake(&connection_id)
                    .unwrap_or_default();
                self.lifecycle_envelope(
                    EventKind::Disconnect,
                    &self.disconnect_route,
                    connection_id,
                    &handshake,
                )
            }
            SocketEvent::Message {
                connection_id,
                event,
                payload,
            } => self.message_envelope(connection_id, &event, payload),
        }
    }

    fn lifecycle_envelope(
        &self,
        kind: EventKind,
        route: &str,
        connection_id: String,
        handshake: &IndexMap<String, String>,
    ) -> Envelope {
        let mut envelope = Envelope::new(Method::POST, kind, route)
            .with_connection_id(connection_id)
            .with_encryption_asserted(
                handshake
                    .get(ENCRYPTION_FIELD)
                    .is_some_and(|v| flag_asserted(v)),
            );
        if let Some(language) = handshake.get(LANGUAGE_FIELD) {
            envelope = envelope.with_language_key(language.clone());
        }
        if let Some(token) = handshake.get(TOKEN_FIELD).filter(|t| !t.trim().is_empty()) {
            envelope = envelope.with_access_token(token.clone());
        }
        for (name, value) in handshake {
            envelope = envelope.with_field(name.clone(), Value::String(value.clone()));
        }
        envelope
    }

    fn message_envelope(&self, connection_id: String, event: &str, payload: Value) -> Envelope {
        let handshake = self
            .registry
            .handshake(&connection_id)
            .unwrap_or_default();

        let lookup = |name: &str| -> Option<String> {
            payload
                .get(name)
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .or_else(|| handshake.get(name).cloned())
        };

        let mut envelope = Envelope::new(Method::POST, EventKind::Message, event)
            .with_connection_id(connection_id)
            .with_encryption_asserted(
                lookup(ENCRYPTION_FIELD).is_some_and(|v| flag_asserted(&v)),
            );
        if let Some(language) = lookup(LANGUAGE_FIELD) {
            envelope = envelope.with_language_key(language);
        }
        if let Some(token) = lookup(TOKEN_FIELD).filter(|t| !t.trim().is_empty()) {
            envelope = envelope.with_access_token(token);
        }
        for (name, value) in &handshake {
            envelope = envelope.with_field(name.clone(), Value::String(value.clone()));
        }
        envelope.with_body(Body::Json(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn handshake() -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        map.insert(LANGUAGE_FIELD.to_string(), "fr".to_string());
        map.insert(TOKEN_FIELD.to_string(), "tok-1".to_string());
        map.insert("x-device".to_string(), "ios".to_string());
        map
    }

    fn adapter_with_connection() -> (SocketAdapter, String) {
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = registry.register(handshake(), tx);
        (SocketAdapter::new(registry), id)
    }

    #[tokio::test]
    async fn test_connect_uses_lifecycle_route() {
        let (adapter, id) = adapter_with_connection();
        let envelope = adapter.envelope(SocketEvent::Connect {
            connection_id: id.clone(),
            handshake: handshake(),
        });
        assert_eq!(envelope.method_name(), Some("socket/connect"));
        assert_eq!(envelope.event(), EventKind::Connect);
        assert_eq!(envelope.connection_id(), Some(id.as_str()));
        assert_eq!(envelope.language_key(), Some("fr"));
        assert_eq!(envelope.access_token(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_message_event_is_the_method_name() {
        let (adapter, id) = adapter_with_connection();
        let envelope = adapter.envelope(SocketEvent::Message {
            connection_id: id,
            event: "orders/place".to_string(),
            payload: json!({ "quantity": 3 }),
        });
        assert_eq!(envelope.method_name(), Some("orders/place"));
        assert_eq!(envelope.event(), EventKind::Message);
        assert_eq!(envelope.body().as_json().unwrap()["quantity"], 3);
    }

    #[tokio::test]
    async fn test_payload_fields_override_handshake() {
        let (adapter, id) = adapter_with_connection();
        let envelope = adapter.envelope(SocketEvent::Message {
            connection_id: id,
            event: "ping".to_string(),
            payload: json!({ "lng_key": "de" }),
        });
        assert_eq!(envelope.language_key(), Some("de"));
        // Token still comes from the handshake.
        assert_eq!(envelope.access_token(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_handshake_lands_in_fields_for_metadata() {
        let (adapter, id) = adapter_with_connection();
        let envelope = adapter.envelope(SocketEvent::Message {
            connection_id: id,
            event: "ping".to_string(),
            payload: json!({}),
        });
        assert_eq!(envelope.field("x-device").unwrap(), "ios");
    }

    #[tokio::test]
    async fn test_disconnect_falls_back_to_registered_handshake() {
        let (adapter, id) = adapter_with_connection();
        let envelope = adapter.envelope(SocketEvent::Disconnect {
            connection_id: id,
        });
        assert_eq!(envelope.method_name(), Some("socket/disconnect"));
        assert_eq!(envelope.language_key(), Some("fr"));
    }

    #[tokio::test]
    async fn test_custom_lifecycle_routes() {
        let registry = Arc::new(ConnectionRegistry::new());
        let adapter = SocketAdapter::new(registry)
            .with_connect_route("session/open")
            .with_disconnect_route("session/close");
        let envelope = adapter.envelope(SocketEvent::Connect {
            connection_id: "c-1".to_string(),
            handshake: IndexMap::new(),
        });
        assert_eq!(envelope.method_name(), Some("session/open"));
        let envelope = adapter.envelope(SocketEvent::Disconnect {
            connection_id: "c-1".to_string(),
        });
        assert_eq!(envelope.method_name(), Some("session/close"));
    }
}
