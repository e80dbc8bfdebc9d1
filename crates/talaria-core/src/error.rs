//! Error types for the dispatch pipeline.
//!
//! Every stage of the pipeline signals failure as a typed [`DispatchError`]
//! rather than returning partial results. The dispatcher is the only boundary
//! that intercepts these: each variant maps onto a response-code string (and
//! an optional named option) looked up through the response renderer, so a
//! failure always resolves to a well-formed response. Only a truly
//! unclassified fault degrades to [`codes::UNKNOWN_ERROR`].

use indexmap::IndexMap;
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Well-known response-code strings emitted by the pipeline itself.
///
/// Projects extend this set through their own response catalogs; these are
/// the codes the framework produces on its own error paths.
pub mod codes {
    /// Catch-all for unclassified faults.
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
    /// Strict encryption policy requires the request to assert encryption.
    pub const ENCRYPTION_STATE_STRICTLY_ENABLED: &str = "ENCRYPTION_STATE_STRICTLY_ENABLED";
    /// The route table could not resolve the requested method.
    pub const METHOD_NOT_LOADED: &str = "METHOD_NOT_LOADED";
    /// The transport verb is not in the handler's declared verb set.
    pub const INVALID_REQUEST_METHOD: &str = "INVALID_REQUEST_METHOD";
    /// A parameter (or the access token) is missing, empty, or uncoercible.
    pub const INVALID_INPUT_EMPTY: &str = "INVALID_INPUT_EMPTY";
    /// Sentinel entry rendered when a response code has no catalog entry.
    pub const RESPONSE_CODE_NOT_FOUND: &str = "RESPONSE_CODE_NOT_FOUND";
    /// Default success code for actions that do not name one.
    pub const SUCCESS: &str = "SUCCESS";
}

/// The option key naming the offending parameter in error responses.
pub const PARAM_NAME_OPTION: &str = "paramName";

/// Errors produced by the dispatch pipeline.
///
/// # Example
///
/// ```
/// use talaria_core::{codes, DispatchError};
///
/// let err = DispatchError::validation(codes::INVALID_INPUT_EMPTY, "quantity");
/// assert_eq!(err.response_code(), codes::INVALID_INPUT_EMPTY);
/// ```
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Strict encryption mode and the request did not assert the encryption flag.
    #[error("strict encryption policy requires an encrypted request")]
    Policy,

    /// The method name could not be resolved to a handler pair.
    #[error("method not loaded: {method_name}")]
    Routing {
        /// The method name that failed to resolve.
        method_name: String,
    },

    /// The transport verb is not permitted by the handler's initializer.
    #[error("request verb not allowed for this handler")]
    MethodMismatch,

    /// The access credential was missing, undecodable, or unverifiable.
    #[error("credential rejected: {parameter}")]
    Auth {
        /// The parameter name carried in the error response.
        parameter: String,
    },

    /// A declared parameter failed validation.
    #[error("parameter validation failed: {code} ({parameter})")]
    Validation {
        /// The response code for this validation failure.
        code: String,
        /// The offending parameter name.
        parameter: String,
    },

    /// The response catalog or output template could not be rendered.
    #[error("response rendering failed: {0}")]
    Render(String),

    /// Anything the pipeline could not classify, cipher failures included.
    #[error("unclassified dispatch failure")]
    Unknown {
        /// The underlying fault, kept for dev-mode debug output only.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DispatchError {
    /// Creates a routing error for an unresolvable method name.
    #[must_use]
    pub fn routing(method_name: impl Into<String>) -> Self {
        Self::Routing {
            method_name: method_name.into(),
        }
    }

    /// Creates an auth error naming the credential parameter.
    #[must_use]
    pub fn auth(parameter: impl Into<String>) -> Self {
        Self::Auth {
            parameter: parameter.into(),
        }
    }

    /// Creates a validation error for a parameter.
    #[must_use]
    pub fn validation(code: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::Validation {
            code: code.into(),
            parameter: parameter.into(),
        }
    }

    /// Creates a render error.
    #[must_use]
    pub fn render(reason: impl Into<String>) -> Self {
        Self::Render(reason.into())
    }

    /// Creates an unclassified error with an underlying source.
    pub fn unknown(source: impl Into<anyhow::Error>) -> Self {
        Self::Unknown {
            source: Some(source.into()),
        }
    }

    /// Returns the response-code string rendered for this error.
    #[must_use]
    pub fn response_code(&self) -> &str {
        match self {
            Self::Policy => codes::ENCRYPTION_STATE_STRICTLY_ENABLED,
            Self::Routing { .. } => codes::METHOD_NOT_LOADED,
            Self::MethodMismatch => codes::INVALID_REQUEST_METHOD,
            Self::Auth { .. } => codes::INVALID_INPUT_EMPTY,
            Self::Validation { code, .. } => code,
            Self::Render(_) | Self::Unknown { .. } => codes::UNKNOWN_ERROR,
        }
    }

    /// Returns the named options substituted into the rendered message.
    #[must_use]
    pub fn response_options(&self) -> Option<IndexMap<String, String>> {
        match self {
            Self::Auth { parameter } | Self::Validation { parameter, .. } => {
                let mut options = IndexMap::new();
                options.insert(PARAM_NAME_OPTION.to_string(), parameter.clone());
                Some(options)
            }
            _ => None,
        }
    }

    /// Returns the debug detail attached under development mode.
    #[must_use]
    pub fn debug_detail(&self) -> Option<String> {
        match self {
            Self::Unknown {
                source: Some(source),
            } => Some(source.to_string()),
            Self::Render(reason) => Some(reason.clone()),
            Self::Routing { method_name } => Some(format!("method not loaded: {method_name}")),
            _ => None,
        }
    }
}
