//! # Talaria WS
//!
//! Socket transport plumbing for the Talaria dispatch pipeline: a live
//! connection registry with fire-and-forget emits, and an adapter that
//! normalizes socket lifecycle events into dispatchable envelopes.
//!
//! The actual wire protocol (WebSocket framing, handshake upgrade) is the
//! embedding server's concern; this crate starts where a connection and
//! its messages already exist.

#![doc(html_root_url = "https://docs.rs/talaria-ws/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod registry;

pub use adapter::{SocketAdapter, SocketEvent};
pub use registry::{ConnectionRegistry, OutboundSender};
