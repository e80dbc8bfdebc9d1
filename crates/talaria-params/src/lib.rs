//! # Talaria Params
//!
//! Parameter validation and coercion for the Talaria dispatch pipeline.
//!
//! Two pieces live here:
//!
//! - [`validate`] - coerces, defaults, and validates one parameter
//!   definition against a raw value
//! - [`process`] - filters an incoming data bag down to the declared
//!   schema, trims string values, and drives the validator over each
//!   declared parameter in schema-declaration order

#![doc(html_root_url = "https://docs.rs/talaria-params/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod processor;
mod validator;

pub use processor::process;
pub use validator::{validate, ValidationFailure};
