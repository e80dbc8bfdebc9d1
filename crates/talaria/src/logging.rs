//! Structured logging setup.
//!
//! Thin wrapper over the tracing-subscriber ecosystem: JSON output for
//! production, pretty output for development, level selection through the
//! usual env-filter syntax.
//!
//! # Example
//!
//! ```rust,ignore
//! use talaria::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(method = "user/list", "dispatching");
//! ```

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Errors produced while initializing logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The subscriber could not be installed or the filter was invalid.
    #[error("logging initialization failed: {0}")]
    Init(String),
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled at all.
    pub enabled: bool,
    /// Filter directive (e.g. `info`, `talaria=debug`).
    pub level: String,
    /// JSON output instead of human-readable.
    pub json_format: bool,
    /// Include file and line info.
    pub file_line_info: bool,
    /// Include the module-path target.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable debug output for local development.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON info-level output for production.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
        }
    }
}

/// Installs the global logging subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::Init`] if the filter directive is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LoggingError::Init(format!("invalid filter directive: {e}")))?;

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);
        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);
        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| LoggingError::Init(e.to_string()))?;
    }

    Ok(())
}

/// Standard log field names, for consistency across the pipeline.
pub mod fields {
    /// The sanitized method name being dispatched.
    pub const METHOD_NAME: &str = "method";

    /// The transport verb.
    pub const VERB: &str = "verb";

    /// The socket connection id.
    pub const CONNECTION_ID: &str = "connection";

    /// The response-code string selected for the reply.
    pub const RESPONSE_CODE: &str = "code";

    /// The verified caller's log id.
    pub const CALLER: &str = "caller";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_disabled_logging_is_a_no_op() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let config = LogConfig {
            level: "not a [valid] directive!!".to_string(),
            ..LogConfig::development()
        };
        assert!(matches!(init_logging(&config), Err(LoggingError::Init(_))));
    }
}
