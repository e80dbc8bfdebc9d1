//! # Talaria Dispatch
//!
//! The request-dispatch pipeline: route resolution, encryption policy,
//! the access gate, parameter processing, action execution, and response
//! rendering, composed into a single [`Dispatcher`] whose public entry
//! point never fails.
//!
//! Transports normalize their requests into `talaria_core::Envelope`
//! values and hand them to [`Dispatcher::dispatch`]; everything after that
//! point is transport-neutral.

#![doc(html_root_url = "https://docs.rs/talaria-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod metadata;
mod route;

pub use dispatcher::Dispatcher;
pub use metadata::collect as collect_metadata;
pub use route::{HandlerFactory, RouteTable, StaticRouteTable};
