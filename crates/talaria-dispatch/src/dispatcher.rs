//! The dispatch pipeline.
//!
//! One dispatcher instance serves the whole process. Each request flows
//! through a fixed sequence: encryption policy, route resolution, verb
//! check, access gate, metadata collection, body extraction, parameter
//! processing, action execution, and response rendering. Every failure
//! short-circuits into a typed [`DispatchError`] which the dispatcher
//! renders through the same response catalogs as success replies, so the
//! public entry point never fails.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{Map, Value};

use talaria_cipher::BodyCipher;
use talaria_core::{
    ActionContext, ActionReply, Body, DispatchError, DispatchResult, EncryptionMode, Envelope,
    HandlerResolution, Initializer, ParameterKind, TalariaConfig,
};
use talaria_gate::{AccessGate, Hs256Decoder, IdentityStore, TokenDecoder};
use talaria_respond::{Rendered, Renderer, ResponseEnvelope};

use crate::metadata;
use crate::route::RouteTable;

/// The request-dispatch pipeline.
///
/// Built once at startup from the immutable process configuration; shared
/// across requests. Handlers themselves are built fresh per request by the
/// route table.
pub struct Dispatcher {
    config: TalariaConfig,
    routes: Arc<dyn RouteTable>,
    renderer: Renderer,
    cipher: Option<Arc<dyn BodyCipher>>,
    decoder: Arc<dyn TokenDecoder>,
    store: Option<Arc<dyn IdentityStore>>,
}

impl Dispatcher {
    /// Creates a dispatcher with the default HS256 token decoder.
    #[must_use]
    pub fn new(config: TalariaConfig, routes: Arc<dyn RouteTable>, renderer: Renderer) -> Self {
        Self {
            config,
            routes,
            renderer,
            cipher: None,
            decoder: Arc::new(Hs256Decoder::new()),
            store: None,
        }
    }

    /// Attaches the body cipher used by the `Optional` and `Strict` modes.
    #[must_use]
    pub fn with_cipher(mut self, cipher: Arc<dyn BodyCipher>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Replaces the token decoder.
    #[must_use]
    pub fn with_token_decoder(mut self, decoder: Arc<dyn TokenDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Attaches the identity store consulted in store-backed auth mode.
    #[must_use]
    pub fn with_identity_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Dispatches one request to its final rendered response.
    ///
    /// This entry point never fails: pipeline errors render through the
    /// response catalogs, and a rendering failure on the error path falls
    /// back to a fixed generic response.
    pub async fn dispatch(&self, envelope: Envelope) -> Rendered {
        let language = envelope.language_key().map(ToString::to_string);

        match self.run(envelope).await {
            Ok(reply) => {
                let rendered = self.renderer.render(
                    &reply.response_code,
                    &reply.options,
                    reply.catalog_package.as_deref(),
                    language.as_deref(),
                    reply.data,
                    None,
                );
                match rendered {
                    Ok(rendered) => rendered,
                    Err(error) => self.render_error(language.as_deref(), &error.into()),
                }
            }
            Err(error) => self.render_error(language.as_deref(), &error),
        }
    }

    async fn run(&self, mut envelope: Envelope) -> DispatchResult<ActionReply> {
        let encryption_active = self.encryption_active(&envelope)?;

        let method_name = self.resolve_method_name(&mut envelope);
        tracing::debug!(method = %method_name, verb = %envelope.verb(), "dispatching");

        let HandlerResolution {
            initializer,
            mut action,
        } = self
            .routes
            .resolve(&method_name)
            .ok_or_else(|| DispatchError::routing(method_name.clone()))?;

        if !initializer.allows_verb(envelope.verb()) {
            return Err(DispatchError::MethodMismatch);
        }

        let identity = if initializer.is_secured() {
            Some(self.verify_caller(&envelope).await?)
        } else {
            None
        };

        let metadata = metadata::collect(self.config.metadata.as_ref(), &envelope);
        let bag = self.extract_data_bag(&mut envelope, &initializer, encryption_active)?;
        let mut parameters = talaria_params::process(initializer.schema(), &bag)?;

        // Path parameters are dispatcher-derived, not caller input, so ones
        // outside the declared schema survive the over-posting filter.
        // Declared ones came through the bag already validated and coerced.
        for (name, value) in envelope.path_parameters() {
            if !parameters.contains_key(name) {
                parameters.insert(name.clone(), Value::String(value.clone()));
            }
        }

        let ctx = ActionContext {
            identity,
            language_key: envelope.language_key().map(ToString::to_string),
            metadata,
            parameters,
        };

        let mut reply = action.execute(&ctx).await?;
        if encryption_active {
            reply.data = self.encrypt_data(reply.data)?;
        }
        Ok(reply)
    }

    /// Applies the encryption policy and decides whether body encryption
    /// is active for this request.
    fn encryption_active(&self, envelope: &Envelope) -> DispatchResult<bool> {
        match self.config.encryption {
            EncryptionMode::Disabled => Ok(false),
            EncryptionMode::Optional => Ok(envelope.encryption_asserted()),
            EncryptionMode::Strict => {
                if envelope.encryption_asserted() {
                    Ok(true)
                } else {
                    Err(DispatchError::Policy)
                }
            }
        }
    }

    /// Takes the raw method name out of the envelope and applies the
    /// custom-route rewrite, if one is configured.
    fn resolve_method_name(&self, envelope: &mut Envelope) -> String {
        let raw = envelope.take_method_name().unwrap_or_default();
        match self.config.custom_route(&raw) {
            Some(route) => {
                envelope.set_path_parameters(route.path_parameters.clone());
                route.target.clone()
            }
            None => raw,
        }
    }

    async fn verify_caller(
        &self,
        envelope: &Envelope,
    ) -> DispatchResult<talaria_core::CallerIdentity> {
        let gate = AccessGate::new(
            &self.config.auth,
            Arc::clone(&self.decoder),
            self.store.clone(),
        );
        let identity = gate.verify(envelope.access_token()).await?;
        tracing::debug!(caller = %identity.log_id(), "credential verified");
        Ok(identity)
    }

    /// Builds the raw data bag the parameter processor runs over.
    ///
    /// The body object is the primary source; declared parameters missing
    /// from the body fall back to envelope fields (query, handshake data),
    /// and path parameters from a custom-route rewrite override both.
    /// File-expecting handlers bypass decryption entirely: a raw upload
    /// body travels as-is under the declared file parameter's name.
    fn extract_data_bag(
        &self,
        envelope: &mut Envelope,
        initializer: &Initializer,
        encryption_active: bool,
    ) -> DispatchResult<Value> {
        let decrypt = encryption_active && !initializer.expects_file();
        let body = envelope.take_body();

        let body_value = if decrypt {
            match body {
                Body::Empty => Value::Object(Map::new()),
                Body::Raw(bytes) => {
                    let text = std::str::from_utf8(&bytes).map_err(|_| {
                        DispatchError::unknown(anyhow::anyhow!(
                            "encrypted body is not valid UTF-8"
                        ))
                    })?;
                    self.decrypt_body(text.trim())?
                }
                Body::Json(Value::String(text)) => self.decrypt_body(text.trim())?,
                Body::Json(_) => {
                    return Err(DispatchError::unknown(anyhow::anyhow!(
                        "encrypted request carried a structured body"
                    )))
                }
            }
        } else {
            match body {
                Body::Json(value) => value,
                Body::Raw(bytes) if initializer.expects_file() => {
                    file_upload_bag(initializer, &bytes)
                }
                Body::Empty | Body::Raw(_) => Value::Object(Map::new()),
            }
        };

        let mut bag = match body_value {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        for definition in initializer.schema().values() {
            if !bag.contains_key(&definition.name) {
                if let Some(value) = envelope.field(&definition.name) {
                    bag.insert(definition.name.clone(), value.clone());
                }
            }
        }
        for (name, value) in envelope.path_parameters() {
            bag.insert(name.clone(), Value::String(value.clone()));
        }
        Ok(Value::Object(bag))
    }

    fn decrypt_body(&self, ciphertext: &str) -> DispatchResult<Value> {
        let cipher = self.require_cipher()?;
        let plaintext = cipher.decrypt(ciphertext).map_err(DispatchError::unknown)?;
        serde_json::from_slice(&plaintext).map_err(DispatchError::unknown)
    }

    fn encrypt_data(&self, data: Value) -> DispatchResult<Value> {
        let cipher = self.require_cipher()?;
        let plaintext = serde_json::to_vec(&data).map_err(DispatchError::unknown)?;
        let wire = cipher.encrypt(&plaintext).map_err(DispatchError::unknown)?;
        Ok(Value::String(wire))
    }

    fn require_cipher(&self) -> DispatchResult<&Arc<dyn BodyCipher>> {
        self.cipher
            .as_ref()
            .ok_or_else(|| DispatchError::unknown(anyhow::anyhow!("no body cipher configured")))
    }

    /// Renders an error response, falling back to a fixed generic
    /// response if the catalogs themselves cannot render.
    fn render_error(&self, language: Option<&str>, error: &DispatchError) -> Rendered {
        tracing::warn!(code = error.response_code(), %error, "request failed");

        let options = error.response_options().unwrap_or_default();
        let debug_message = if self.config.development_mode {
            error.debug_detail()
        } else {
            None
        };

        let rendered = self.renderer.render(
            error.response_code(),
            &options,
            None,
            language,
            Value::Null,
            debug_message,
        );
        match rendered {
            Ok(rendered) => rendered,
            Err(render_error) => {
                tracing::error!(%render_error, "error response failed to render");
                Rendered::Structured(fallback_envelope())
            }
        }
    }
}

/// Places a raw upload body under the first declared file parameter.
///
/// JSON cannot carry bytes, so the payload travels base64-encoded; the
/// validator passes file values through untouched.
fn file_upload_bag(initializer: &Initializer, bytes: &[u8]) -> Value {
    let mut bag = Map::new();
    if let Some(definition) = initializer
        .schema()
        .values()
        .find(|d| d.kind == ParameterKind::File)
    {
        bag.insert(definition.name.clone(), Value::String(BASE64.encode(bytes)));
    }
    Value::Object(bag)
}

/// The response of last resort, used when the catalogs cannot render.
fn fallback_envelope() -> ResponseEnvelope {
    ResponseEnvelope {
        response_code: Value::from(500),
        response_message: "An unknown error occurred. Please try again later.".to_string(),
        response_data: Value::Null,
        debug_message: None,
    }
}
