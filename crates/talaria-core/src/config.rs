//! Process-wide configuration.
//!
//! Configuration is loaded once at process start into an immutable
//! [`TalariaConfig`] passed by reference into the dispatcher; it is never
//! re-read per request. The loader applies layers, later layers overriding
//! earlier ones: built-in defaults, then an optional JSON file, then
//! environment variables.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        /// The offending path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file or an environment value could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A field holds an invalid value.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// The offending field path.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Process-wide encryption policy for request/response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMode {
    /// Bodies are never encrypted.
    #[default]
    Disabled,
    /// Bodies are encrypted when the request asserts the encryption flag.
    Optional,
    /// Every request must assert the encryption flag.
    Strict,
}

/// How the access gate verifies a decoded credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Trust the decoded identity claim directly.
    #[default]
    Claim,
    /// Look the credential up in the identity store as well.
    ClaimStore,
}

/// Access-gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Verification mode.
    #[serde(default)]
    pub mode: AuthMode,
    /// Secret handed to the token decoder.
    #[serde(default)]
    pub token_secret: String,
    /// The claim key carrying the identity (e.g. `user_id`).
    #[serde(default = "default_claim_id_key")]
    pub claim_id_key: String,
    /// Store table consulted in `ClaimStore` mode.
    #[serde(default)]
    pub store_table: String,
    /// Store column holding the raw credential.
    #[serde(default = "default_store_access_key")]
    pub store_access_key: String,
    /// Store column holding the identity claim value.
    #[serde(default = "default_claim_id_key")]
    pub store_id_key: String,
}

fn default_claim_id_key() -> String {
    "user_id".to_string()
}

fn default_store_access_key() -> String {
    "access_token".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            token_secret: String::new(),
            claim_id_key: default_claim_id_key(),
            store_table: String::new(),
            store_access_key: default_store_access_key(),
            store_id_key: default_claim_id_key(),
        }
    }
}

/// Mapping of metadata keys to envelope field names.
///
/// When present and well-formed, the dispatcher collects the named envelope
/// fields into a metadata object attached to the action context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataSchema(pub IndexMap<String, String>);

impl MetadataSchema {
    /// Returns true if no fields are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A custom-route rewrite target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRoute {
    /// The method name to dispatch instead of the raw one.
    pub target: String,
    /// Path parameters derived from the rewrite.
    #[serde(default)]
    pub path_parameters: IndexMap<String, String>,
}

/// Output-template selection for the response renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseTemplateConfig {
    /// Custom template text; `None` selects the structured passthrough.
    #[serde(default)]
    pub text: Option<String>,
    /// Whether the templated text is re-parsed into structured data.
    #[serde(default)]
    pub reparse_output: bool,
}

/// Complete Talaria configuration, immutable for the process lifetime.
///
/// # Example
///
/// ```
/// use talaria_core::{EncryptionMode, TalariaConfig};
///
/// let config = TalariaConfig::default();
/// assert_eq!(config.encryption, EncryptionMode::Disabled);
/// assert_eq!(config.default_language, "en");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TalariaConfig {
    /// Body encryption policy.
    #[serde(default)]
    pub encryption: EncryptionMode,

    /// Access-gate settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Optional metadata field schema.
    #[serde(default)]
    pub metadata: Option<MetadataSchema>,

    /// Attach fault detail to generic error responses.
    #[serde(default)]
    pub development_mode: bool,

    /// Language key used when an entry lacks the caller's language.
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Custom-route rewrites, raw method name to target.
    #[serde(default)]
    pub custom_routes: IndexMap<String, CustomRoute>,

    /// Response output-template selection.
    #[serde(default)]
    pub response_template: ResponseTemplateConfig,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for TalariaConfig {
    fn default() -> Self {
        Self {
            encryption: EncryptionMode::default(),
            auth: AuthConfig::default(),
            metadata: None,
            development_mode: false,
            default_language: default_language(),
            custom_routes: IndexMap::new(),
            response_template: ResponseTemplateConfig::default(),
        }
    }
}

impl TalariaConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> TalariaConfigBuilder {
        TalariaConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - the default language is empty
    /// - `ClaimStore` mode is selected without a store table
    /// - a custom route targets an empty method name
    /// - re-parsing is requested without a custom template
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_language.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "default_language",
                "must not be empty",
            ));
        }

        if self.auth.mode == AuthMode::ClaimStore && self.auth.store_table.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "auth.store_table",
                "required when auth.mode is 'claim_store'",
            ));
        }

        for (raw, route) in &self.custom_routes {
            if route.target.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("custom_routes.{raw}.target"),
                    "must not be empty",
                ));
            }
        }

        if self.response_template.reparse_output && self.response_template.text.is_none() {
            return Err(ConfigError::invalid_value(
                "response_template.reparse_output",
                "requires response_template.text",
            ));
        }

        Ok(())
    }

    /// A custom-route rewrite for the raw method name, if configured.
    #[must_use]
    pub fn custom_route(&self, method_name: &str) -> Option<&CustomRoute> {
        self.custom_routes.get(method_name)
    }
}

/// Builder for [`TalariaConfig`].
#[derive(Debug, Default)]
pub struct TalariaConfigBuilder {
    config: TalariaConfig,
}

impl TalariaConfigBuilder {
    /// Creates a builder seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encryption policy.
    #[must_use]
    pub fn encryption(mut self, mode: EncryptionMode) -> Self {
        self.config.encryption = mode;
        self
    }

    /// Sets the access-gate configuration.
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Sets the metadata schema.
    #[must_use]
    pub fn metadata(mut self, schema: MetadataSchema) -> Self {
        self.config.metadata = Some(schema);
        self
    }

    /// Enables development mode.
    #[must_use]
    pub fn development_mode(mut self, enabled: bool) -> Self {
        self.config.development_mode = enabled;
        self
    }

    /// Sets the default language key.
    #[must_use]
    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.config.default_language = language.into();
        self
    }

    /// Adds a custom-route rewrite.
    #[must_use]
    pub fn custom_route(mut self, raw: impl Into<String>, route: CustomRoute) -> Self {
        self.config.custom_routes.insert(raw.into(), route);
        self
    }

    /// Sets the response output-template selection.
    #[must_use]
    pub fn response_template(mut self, template: ResponseTemplateConfig) -> Self {
        self.config.response_template = template;
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> TalariaConfig {
        self.config
    }
}

/// Layered configuration loader: defaults, then file, then environment.
///
/// # Example
///
/// ```no_run
/// use talaria_core::ConfigLoader;
///
/// # fn main() -> Result<(), talaria_core::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("talaria.json")?
///     .with_env_prefix("TALARIA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: TalariaConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON configuration file over the current layer.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        self.config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        Ok(self)
    }

    /// Loads the file if it exists; silently continues otherwise.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Enables the environment layer with the given variable prefix.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Applies the environment layer and validates the result.
    pub fn load(mut self) -> Result<TalariaConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    fn apply_env(&mut self, prefix: &str) -> Result<(), ConfigError> {
        if let Ok(value) = env::var(format!("{prefix}_ENCRYPTION_MODE")) {
            self.config.encryption = parse_enum(&value, "encryption")?;
        }
        if let Ok(value) = env::var(format!("{prefix}_AUTH_MODE")) {
            self.config.auth.mode = parse_enum(&value, "auth.mode")?;
        }
        if let Ok(value) = env::var(format!("{prefix}_AUTH_TOKEN_SECRET")) {
            self.config.auth.token_secret = value;
        }
        if let Ok(value) = env::var(format!("{prefix}_DEVELOPMENT_MODE")) {
            self.config.development_mode = matches!(value.as_str(), "1" | "true");
        }
        if let Ok(value) = env::var(format!("{prefix}_DEFAULT_LANGUAGE")) {
            self.config.default_language = value;
        }
        Ok(())
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(value: &str, field: &str) -> Result<T, ConfigError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| ConfigError::invalid_value(field, format!("unrecognized value '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TalariaConfig::default();
        assert_eq!(config.encryption, EncryptionMode::Disabled);
        assert_eq!(config.auth.mode, AuthMode::Claim);
        assert_eq!(config.auth.claim_id_key, "user_id");
        assert!(!config.development_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = TalariaConfig::builder()
            .encryption(EncryptionMode::Strict)
            .development_mode(true)
            .default_language("fr")
            .build();
        assert_eq!(config.encryption, EncryptionMode::Strict);
        assert!(config.development_mode);
        assert_eq!(config.default_language, "fr");
    }

    #[test]
    fn test_claim_store_requires_table() {
        let config = TalariaConfig::builder()
            .auth(AuthConfig {
                mode: AuthMode::ClaimStore,
                ..AuthConfig::default()
            })
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_reparse_requires_template() {
        let config = TalariaConfig::builder()
            .response_template(ResponseTemplateConfig {
                text: None,
                reparse_output: true,
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "encryption": "optional",
            "auth": { "mode": "claim", "token_secret": "s3cret" },
            "development_mode": true,
            "custom_routes": {
                "orders/42": { "target": "orders/detail", "path_parameters": { "id": "42" } }
            }
        }"#;
        let config: TalariaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.encryption, EncryptionMode::Optional);
        assert_eq!(config.auth.token_secret, "s3cret");
        let route = config.custom_route("orders/42").unwrap();
        assert_eq!(route.target, "orders/detail");
        assert_eq!(route.path_parameters["id"], "42");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = serde_json::from_str::<TalariaConfig>(r#"{ "surprise": 1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new().with_file("/definitely/not/here.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
