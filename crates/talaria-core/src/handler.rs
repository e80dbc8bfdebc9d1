//! Handler descriptors and the action trait.
//!
//! A handler is a pair: a static [`Initializer`] describing the allowed
//! verbs, the security requirement, and the parameter schema, plus an
//! [`Action`] that executes after validation. Both are resolved fresh per
//! request through the route table; instances are never reused across
//! requests, so member state (identity, parameters, metadata) cannot leak
//! between requests.

use crate::{CallerIdentity, DispatchResult};
use async_trait::async_trait;
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::codes;

/// The declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Coerced through numeric parse.
    Number,
    /// Coerced through stringification.
    String,
    /// An uploaded file; bodies with file parameters bypass decryption.
    File,
}

/// Static definition of one declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// The parameter name as it appears in the request body.
    pub name: String,
    /// The declared type.
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    /// Whether the parameter must carry a non-empty value.
    #[serde(default)]
    pub required: bool,
    /// Default substituted when the value is absent; `None` means no default.
    #[serde(default)]
    pub default: Option<String>,
}

impl ParameterDefinition {
    /// Creates an optional parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// Creates a required parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    /// Attaches a default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Static descriptor of a handler: verbs, security, parameter schema.
///
/// # Example
///
/// ```
/// use http::Method;
/// use talaria_core::{Initializer, ParameterDefinition, ParameterKind};
///
/// let init = Initializer::new()
///     .verb(Method::POST)
///     .secured(true)
///     .parameter(ParameterDefinition::required("quantity", ParameterKind::Number));
/// assert!(init.allows_verb(&Method::POST));
/// assert!(!init.allows_verb(&Method::GET));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Initializer {
    verbs: Vec<Method>,
    secured: bool,
    schema: IndexMap<String, ParameterDefinition>,
}

impl Initializer {
    /// Creates an empty initializer (no verbs allowed, unsecured).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an allowed verb.
    #[must_use]
    pub fn verb(mut self, verb: Method) -> Self {
        self.verbs.push(verb);
        self
    }

    /// Marks the handler as requiring a verified credential.
    #[must_use]
    pub fn secured(mut self, secured: bool) -> Self {
        self.secured = secured;
        self
    }

    /// Declares a parameter; declaration order is the validation order.
    #[must_use]
    pub fn parameter(mut self, definition: ParameterDefinition) -> Self {
        self.schema.insert(definition.name.clone(), definition);
        self
    }

    /// Whether the given transport verb is permitted.
    #[must_use]
    pub fn allows_verb(&self, verb: &Method) -> bool {
        self.verbs.iter().any(|v| v == verb)
    }

    /// Whether the handler requires a verified credential.
    #[must_use]
    pub fn is_secured(&self) -> bool {
        self.secured
    }

    /// The declared parameter schema, in declaration order.
    #[must_use]
    pub fn schema(&self) -> &IndexMap<String, ParameterDefinition> {
        &self.schema
    }

    /// Whether any declared parameter is file-typed.
    #[must_use]
    pub fn expects_file(&self) -> bool {
        self.schema
            .values()
            .any(|p| p.kind == ParameterKind::File)
    }
}

/// Per-request state handed to the action.
///
/// Built by the dispatcher after the gate and the parameter processor have
/// run; discarded with the action once the response is produced.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// The verified caller, for secured handlers.
    pub identity: Option<CallerIdentity>,
    /// The caller's language key, if supplied.
    pub language_key: Option<String>,
    /// The metadata object collected per the process-wide metadata schema.
    pub metadata: Option<Value>,
    /// Validated and coerced parameters, keyed by declared name.
    pub parameters: IndexMap<String, Value>,
}

impl ActionContext {
    /// A validated parameter by its declared name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }
}

/// What an action hands back: response data plus the response selection.
#[derive(Debug, Clone)]
pub struct ActionReply {
    /// The payload attached as `responseData`.
    pub data: Value,
    /// The response-code string looked up in the catalogs.
    pub response_code: String,
    /// Named options substituted into the catalog message.
    pub options: IndexMap<String, String>,
    /// Optional package-scoped catalog to overlay.
    pub catalog_package: Option<String>,
}

impl ActionReply {
    /// A successful reply carrying the default `SUCCESS` code.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            response_code: codes::SUCCESS.to_string(),
            options: IndexMap::new(),
            catalog_package: None,
        }
    }

    /// Overrides the response code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response_code = code.into();
        self
    }

    /// Adds a named option for message substitution.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Selects a package-scoped response catalog.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.catalog_package = Some(package.into());
        self
    }
}

/// The executable unit invoked after validation.
///
/// `execute` is the only point in the pipeline expected to suspend; the
/// dispatcher awaits it exactly once per request, after all synchronous
/// validation has passed.
#[async_trait]
pub trait Action: Send {
    /// Executes the handler with the validated request context.
    async fn execute(&mut self, ctx: &ActionContext) -> DispatchResult<ActionReply>;
}

/// A resolved handler pair, built fresh for one request.
pub struct HandlerResolution {
    /// The static descriptor.
    pub initializer: Initializer,
    /// The executable unit.
    pub action: Box<dyn Action>,
}
