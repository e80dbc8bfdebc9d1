//! # Talaria Respond
//!
//! Layered response catalogs, localization, and output templates for the
//! Talaria dispatch pipeline.
//!
//! A response is selected by its response-code string from three catalog
//! layers (framework base, project, optional package scope), localized by
//! the caller's language key, placeholder-substituted from the action's
//! named options, and finally compiled through an output template.

#![doc(html_root_url = "https://docs.rs/talaria-respond/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catalog;
mod renderer;
mod template;

pub use catalog::{
    Catalog, CatalogEntry, CatalogProvider, FsCatalogProvider, MemoryCatalogProvider,
};
pub use renderer::{Renderer, ResponseEnvelope};
pub use template::{OutputTemplate, Rendered, RenderError};
