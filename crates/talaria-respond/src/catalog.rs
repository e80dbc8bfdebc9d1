//! Response catalogs and their providers.
//!
//! A catalog maps response-code strings to localized message entries.
//! Catalogs come in three layers: the framework-wide base catalog embedded
//! in this crate, a project-level catalog, and optionally a package-scoped
//! catalog looked up by a package-name-derived path. Later overlays win at
//! whole-entry granularity.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::template::RenderError;

/// One response-catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The code exposed to clients (often numeric).
    #[serde(rename = "responseCode")]
    pub response_code: Value,

    /// Localized message texts, keyed by language.
    #[serde(rename = "responseMessage")]
    pub response_message: IndexMap<String, String>,

    /// Project-defined extra fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A response catalog: response-code string to entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(IndexMap<String, CatalogEntry>);

impl Catalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a catalog from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|e| RenderError::CatalogParse(e.to_string()))
    }

    /// Inserts an entry.
    pub fn insert(&mut self, code: impl Into<String>, entry: CatalogEntry) {
        self.0.insert(code.into(), entry);
    }

    /// Looks up an entry by response-code string.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&CatalogEntry> {
        self.0.get(code)
    }

    /// Overlays another catalog; its entries win per top-level code.
    pub fn overlay(&mut self, other: Self) {
        for (code, entry) in other.0 {
            self.0.insert(code, entry);
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Supplies the project and package catalog layers.
///
/// The base layer is framework-wide and embedded in this crate; providers
/// only answer for the layers that live with the project.
pub trait CatalogProvider: Send + Sync {
    /// The project-level catalog.
    ///
    /// # Errors
    ///
    /// A missing or unparsable project catalog is a fatal rendering error.
    fn project(&self) -> Result<Catalog, RenderError>;

    /// The package-scoped catalog, if the package ships one.
    ///
    /// Lookup failures are swallowed; a package without a catalog simply
    /// contributes nothing.
    fn package(&self, name: &str) -> Option<Catalog>;
}

/// File-backed catalog provider using the conventional paths.
///
/// - project: `<root>/i18n/response.json`
/// - package: `<root>/packages/<name>/contract/response.json`
#[derive(Debug, Clone)]
pub struct FsCatalogProvider {
    root: PathBuf,
}

impl FsCatalogProvider {
    /// Creates a provider rooted at the project directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CatalogProvider for FsCatalogProvider {
    fn project(&self) -> Result<Catalog, RenderError> {
        let path = self.root.join("i18n").join("response.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| RenderError::CatalogLoad(format!("{}: {e}", path.display())))?;
        Catalog::from_json_str(&content)
    }

    fn package(&self, name: &str) -> Option<Catalog> {
        let path = self
            .root
            .join("packages")
            .join(name)
            .join("contract")
            .join("response.json");
        let content = std::fs::read_to_string(&path).ok()?;
        match Catalog::from_json_str(&content) {
            Ok(catalog) => Some(catalog),
            Err(error) => {
                tracing::warn!(package = name, %error, "ignoring unparsable package catalog");
                None
            }
        }
    }
}

/// In-memory catalog provider, mainly for tests and embedded projects.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogProvider {
    project: Catalog,
    packages: IndexMap<String, Catalog>,
}

impl MemoryCatalogProvider {
    /// Creates a provider with the given project catalog.
    #[must_use]
    pub fn new(project: Catalog) -> Self {
        Self {
            project,
            packages: IndexMap::new(),
        }
    }

    /// Registers a package-scoped catalog.
    #[must_use]
    pub fn with_package(mut self, name: impl Into<String>, catalog: Catalog) -> Self {
        self.packages.insert(name.into(), catalog);
        self
    }
}

impl CatalogProvider for MemoryCatalogProvider {
    fn project(&self) -> Result<Catalog, RenderError> {
        Ok(self.project.clone())
    }

    fn package(&self, name: &str) -> Option<Catalog> {
        self.packages.get(name).cloned()
    }
}
