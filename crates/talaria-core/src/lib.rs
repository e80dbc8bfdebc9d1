//! # Talaria Core
//!
//! Core types for the Talaria dispatch pipeline.
//!
//! This crate provides the foundational types used throughout Talaria:
//!
//! - [`Envelope`] - Transport-neutral incoming request representation
//! - [`Initializer`] / [`Action`] - Handler descriptor and executable unit
//! - [`CallerIdentity`] - Verified caller identity
//! - [`DispatchError`] - Standard error taxonomy
//! - [`TalariaConfig`] - Load-once process-wide configuration

#![doc(html_root_url = "https://docs.rs/talaria-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod envelope;
mod error;
mod handler;
mod identity;

pub use config::{
    AuthConfig, AuthMode, ConfigError, ConfigLoader, CustomRoute, EncryptionMode, MetadataSchema,
    ResponseTemplateConfig, TalariaConfig, TalariaConfigBuilder,
};
pub use envelope::{
    flag_asserted, Body, Envelope, EventKind, HttpRequestParts, ENCRYPTION_FIELD, LANGUAGE_FIELD,
    TOKEN_FIELD,
};
pub use error::{codes, DispatchError, DispatchResult, PARAM_NAME_OPTION};
pub use handler::{
    Action, ActionContext, ActionReply, HandlerResolution, Initializer, ParameterDefinition,
    ParameterKind,
};
pub use identity::CallerIdentity;
