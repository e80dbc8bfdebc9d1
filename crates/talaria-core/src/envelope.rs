//! Transport-neutral request envelopes.
//!
//! Transports place the well-known fields (language key, encryption flag,
//! access token) at different nesting depths. Instead of searching the raw
//! request recursively, each transport gets one explicit adapter that lifts
//! those fields into a normalized [`Envelope`] before the pipeline runs. The
//! HTTP adapter lives here; the socket adapter lives in `talaria-ws`.

use bytes::Bytes;
use http::Method;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Field name carrying the caller's language key.
pub const LANGUAGE_FIELD: &str = "lng_key";

/// Field name carrying the request encryption flag.
pub const ENCRYPTION_FIELD: &str = "enc_state";

/// Field name carrying the access credential.
pub const TOKEN_FIELD: &str = "access_token";

/// The kind of transport event that produced an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A plain HTTP call.
    Http,
    /// A socket peer connected.
    Connect,
    /// A socket peer sent a message.
    Message,
    /// A socket peer disconnected.
    Disconnect,
}

/// The request body payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body supplied.
    #[default]
    Empty,
    /// An opaque byte payload (files, ciphertext).
    Raw(Bytes),
    /// A parsed structured payload.
    Json(Value),
}

impl Body {
    /// Returns the structured payload, if this body is structured.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if no body was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// The normalized, transport-neutral incoming request.
///
/// Immutable from the pipeline's perspective except for explicit
/// sanitization of the routing fields: once the dispatcher has resolved the
/// method name it calls [`Envelope::take_method_name`], so handlers never
/// see raw route tokens.
#[derive(Debug, Clone)]
pub struct Envelope {
    verb: Method,
    event: EventKind,
    method_name: Option<String>,
    path_parameters: IndexMap<String, String>,
    language_key: Option<String>,
    encryption_asserted: bool,
    access_token: Option<String>,
    body: Body,
    fields: Map<String, Value>,
    connection_id: Option<String>,
}

impl Envelope {
    /// Creates an envelope from already-normalized parts.
    ///
    /// Transport adapters are the intended callers; tests build envelopes
    /// directly through this constructor.
    #[must_use]
    pub fn new(verb: Method, event: EventKind, method_name: impl Into<String>) -> Self {
        Self {
            verb,
            event,
            method_name: Some(method_name.into()),
            path_parameters: IndexMap::new(),
            language_key: None,
            encryption_asserted: false,
            access_token: None,
            body: Body::Empty,
            fields: Map::new(),
            connection_id: None,
        }
    }

    /// Sets the caller's language key.
    #[must_use]
    pub fn with_language_key(mut self, key: impl Into<String>) -> Self {
        self.language_key = Some(key.into());
        self
    }

    /// Asserts the request encryption flag.
    #[must_use]
    pub fn with_encryption_asserted(mut self, asserted: bool) -> Self {
        self.encryption_asserted = asserted;
        self
    }

    /// Sets the access credential.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the body payload.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Adds an auxiliary field (query/handshake data, metadata sources).
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Tags the envelope with the originating socket connection.
    #[must_use]
    pub fn with_connection_id(mut self, id: impl Into<String>) -> Self {
        self.connection_id = Some(id.into());
        self
    }

    /// The transport verb.
    #[must_use]
    pub fn verb(&self) -> &Method {
        &self.verb
    }

    /// The transport event kind.
    #[must_use]
    pub fn event(&self) -> EventKind {
        self.event
    }

    /// The caller's language key, if supplied.
    #[must_use]
    pub fn language_key(&self) -> Option<&str> {
        self.language_key.as_deref()
    }

    /// Whether the request asserted the encryption flag.
    #[must_use]
    pub fn encryption_asserted(&self) -> bool {
        self.encryption_asserted
    }

    /// The access credential, if supplied.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The body payload.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Takes the body out of the envelope.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// An auxiliary field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The derived path parameters.
    #[must_use]
    pub fn path_parameters(&self) -> &IndexMap<String, String> {
        &self.path_parameters
    }

    /// Replaces the path parameters (custom-route rewrites).
    pub fn set_path_parameters(&mut self, params: IndexMap<String, String>) {
        self.path_parameters = params;
    }

    /// Takes the raw method name, sanitizing the routing fields.
    ///
    /// After this call the envelope no longer carries the raw route token.
    pub fn take_method_name(&mut self) -> Option<String> {
        self.method_name.take()
    }

    /// Returns the raw method name without sanitizing.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// The originating socket connection, for socket transports.
    #[must_use]
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }
}

/// Raw pieces of an HTTP request, before normalization.
///
/// This is the narrow interface a transport adapter fills in; the actual
/// HTTP server is out of scope.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestParts {
    /// The HTTP method.
    pub method: Method,
    /// The request path (e.g. `/user/list`).
    pub path: String,
    /// Request headers, lowercase names.
    pub headers: IndexMap<String, String>,
    /// Query string parameters.
    pub query: IndexMap<String, String>,
    /// The raw body, if any.
    pub body: Option<Bytes>,
}

impl HttpRequestParts {
    /// Normalizes these parts into an [`Envelope`].
    ///
    /// Well-known fields are looked up in a fixed order: headers, then
    /// query, then top-level keys of a JSON body. The method name is the
    /// slash-joined path with the leading slash stripped.
    #[must_use]
    pub fn into_envelope(self) -> Envelope {
        let body = match self.body {
            None => Body::Empty,
            Some(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) if value.is_object() => Body::Json(value),
                _ => Body::Raw(bytes),
            },
        };

        let lookup = |name: &str| -> Option<String> {
            if let Some(v) = self.headers.get(name) {
                return Some(v.clone());
            }
            if let Some(v) = self.query.get(name) {
                return Some(v.clone());
            }
            body.as_json()
                .and_then(|v| v.get(name))
                .and_then(value_as_string)
        };

        let language_key = lookup(LANGUAGE_FIELD);
        let encryption_asserted = lookup(ENCRYPTION_FIELD)
            .map(|v| flag_asserted(&v))
            .unwrap_or(false);
        let access_token = lookup(TOKEN_FIELD).filter(|t| !t.trim().is_empty());

        let method_name = self.path.trim_matches('/').to_string();

        let mut envelope = Envelope::new(self.method, EventKind::Http, method_name);
        envelope.language_key = language_key;
        envelope.encryption_asserted = encryption_asserted;
        envelope.access_token = access_token;
        envelope.body = body;
        for (name, value) in self.query {
            envelope.fields.insert(name, Value::String(value));
        }
        for (name, value) in self.headers {
            envelope
                .fields
                .entry(name)
                .or_insert_with(|| Value::String(value));
        }
        envelope
    }
}

/// Returns true when an encryption-flag value counts as asserted.
#[must_use]
pub fn flag_asserted(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
