//! # Talaria
//!
//! **Transport-neutral request-dispatch framework**
//!
//! Talaria takes normalized request envelopes from any transport (HTTP,
//! sockets) and runs them through one fixed pipeline:
//!
//! ```text
//! Envelope → Encryption Policy → Route → Verb Check → Access Gate
//!          → Metadata → Parameter Processing → Action → Response Render
//! ```
//!
//! Every failure along the way resolves to a well-formed, localized
//! response selected from layered response catalogs; the dispatch entry
//! point never fails.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use talaria::prelude::*;
//!
//! struct ListUsers;
//!
//! #[async_trait::async_trait]
//! impl Action for ListUsers {
//!     async fn execute(&mut self, _ctx: &ActionContext) -> DispatchResult<ActionReply> {
//!         Ok(ActionReply::ok(serde_json::json!({ "users": [] })))
//!     }
//! }
//!
//! let routes = StaticRouteTable::new().route("user/list", || HandlerResolution {
//!     initializer: Initializer::new().verb(http::Method::GET),
//!     action: Box::new(ListUsers),
//! });
//! ```

#![doc(html_root_url = "https://docs.rs/talaria/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use talaria_core as core;

// Re-export parameter processing
pub use talaria_params as params;

// Re-export the access gate
pub use talaria_gate as gate;

// Re-export the body cipher seam
pub use talaria_cipher as cipher;

// Re-export response rendering
pub use talaria_respond as respond;

// Re-export the dispatch pipeline
pub use talaria_dispatch as dispatch;

// Re-export socket plumbing
pub use talaria_ws as ws;

pub mod logging;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use talaria::prelude::*;
/// ```
pub mod prelude {
    pub use talaria_core::{
        codes, Action, ActionContext, ActionReply, Body, CallerIdentity, ConfigLoader,
        DispatchError, DispatchResult, EncryptionMode, Envelope, EventKind, HandlerResolution,
        HttpRequestParts, Initializer, ParameterDefinition, ParameterKind, TalariaConfig,
    };

    pub use talaria_cipher::{BodyCipher, SecretKey, XChaChaBodyCipher};

    pub use talaria_gate::{AccessGate, Hs256Decoder, IdentityStore, TokenDecoder};

    pub use talaria_respond::{
        Catalog, CatalogProvider, FsCatalogProvider, MemoryCatalogProvider, OutputTemplate,
        Rendered, Renderer, ResponseEnvelope,
    };

    pub use talaria_dispatch::{Dispatcher, RouteTable, StaticRouteTable};

    pub use talaria_ws::{ConnectionRegistry, SocketAdapter, SocketEvent};
}
