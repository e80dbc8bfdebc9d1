//! # Talaria Gate
//!
//! Access-gate credential verification for the Talaria dispatch pipeline.
//!
//! The gate verifies an access credential against a pluggable verification
//! backend: decode the token through a [`TokenDecoder`], then either trust
//! the decoded identity claim directly (claim-only mode) or additionally
//! look the credential up through an [`IdentityStore`] (store-backed mode).
//!
//! Every verification failure the caller can cause — a missing, blank,
//! undecodable, or unverifiable credential — surfaces as the same
//! `INVALID_INPUT_EMPTY` error on `access_token`, so responses never leak
//! which check rejected the token.

#![doc(html_root_url = "https://docs.rs/talaria-gate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod decoder;
mod gate;
mod store;

pub use decoder::{Hs256Decoder, TokenDecoder};
pub use gate::{AccessGate, GateError};
pub use store::IdentityStore;
