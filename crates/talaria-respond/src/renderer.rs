//! Response rendering: catalog layering, localization, and substitution.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use talaria_core::codes;

use crate::catalog::{Catalog, CatalogProvider};
use crate::template::{OutputTemplate, RenderError, Rendered};

/// The framework-wide base catalog, shipped with this crate.
const BASE_CATALOG: &str = include_str!("../i18n/response.json");

/// The structured response envelope before template compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// The client-facing code taken from the catalog entry.
    #[serde(rename = "responseCode")]
    pub response_code: Value,

    /// The localized, placeholder-substituted message text.
    #[serde(rename = "responseMessage")]
    pub response_message: String,

    /// The action's payload.
    #[serde(rename = "responseData")]
    pub response_data: Value,

    /// Internal error detail, present only in development mode.
    #[serde(rename = "debugMessage", skip_serializing_if = "Option::is_none")]
    pub debug_message: Option<String>,
}

/// Renders response-code strings into final client-facing values.
///
/// Catalog layering starts from the project catalog, then overlays the
/// framework base, then overlays the package-scoped catalog when the
/// action named one. Later layers win at whole-entry granularity.
pub struct Renderer {
    provider: Arc<dyn CatalogProvider>,
    base: Catalog,
    default_language: String,
    template: OutputTemplate,
}

impl Renderer {
    /// Creates a renderer over the given catalog provider.
    ///
    /// # Errors
    ///
    /// Fails if the embedded base catalog does not parse, which indicates
    /// a corrupted build.
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        default_language: impl Into<String>,
        template: OutputTemplate,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            provider,
            base: Catalog::from_json_str(BASE_CATALOG)?,
            default_language: default_language.into(),
            template,
        })
    }

    /// Renders one response.
    ///
    /// An unknown response-code string falls back to the
    /// `RESPONSE_CODE_NOT_FOUND` sentinel rather than failing, so actions
    /// can return project-defined codes without the pipeline erroring out
    /// on a missing catalog entry.
    pub fn render(
        &self,
        code: &str,
        options: &IndexMap<String, String>,
        package: Option<&str>,
        language: Option<&str>,
        data: Value,
        debug_message: Option<String>,
    ) -> Result<Rendered, RenderError> {
        let catalog = self.merged_catalog(package)?;
        let (effective_code, entry) = match catalog.get(code) {
            Some(entry) => (code, entry),
            None => {
                tracing::warn!(code, "response code not present in any catalog layer");
                let sentinel = codes::RESPONSE_CODE_NOT_FOUND;
                let entry = catalog.get(sentinel).ok_or_else(|| {
                    RenderError::MissingMessage {
                        code: sentinel.to_string(),
                        language: self.default_language.clone(),
                    }
                })?;
                (sentinel, entry)
            }
        };

        let language = language.unwrap_or(&self.default_language);
        let text = entry
            .response_message
            .get(language)
            .or_else(|| entry.response_message.get(&self.default_language))
            .ok_or_else(|| RenderError::MissingMessage {
                code: effective_code.to_string(),
                language: self.default_language.clone(),
            })?;

        let envelope = ResponseEnvelope {
            response_code: entry.response_code.clone(),
            response_message: substitute(text, options),
            response_data: data,
            debug_message,
        };
        self.template.compile(envelope)
    }

    fn merged_catalog(&self, package: Option<&str>) -> Result<Catalog, RenderError> {
        let mut catalog = self.provider.project()?;
        catalog.overlay(self.base.clone());
        if let Some(name) = package {
            if let Some(scoped) = self.provider.package(name) {
                catalog.overlay(scoped);
            }
        }
        Ok(catalog)
    }
}

/// Substitutes `{name}` placeholders from the action's named options.
///
/// Replacements run in option declaration order, and text introduced by
/// one replacement is never rescanned by later ones.
fn substitute(text: &str, options: &IndexMap<String, String>) -> String {
    // Segments alternate between template text, which later options may
    // still match in, and substituted text, which is locked.
    let mut segments: Vec<(String, bool)> = vec![(text.to_string(), false)];

    for (name, value) in options {
        let placeholder = format!("{{{name}}}");
        let mut next = Vec::with_capacity(segments.len());
        for (segment, locked) in segments {
            if locked || !segment.contains(&placeholder) {
                next.push((segment, locked));
                continue;
            }
            let mut parts = segment.split(&placeholder).peekable();
            while let Some(part) = parts.next() {
                if !part.is_empty() {
                    next.push((part.to_string(), false));
                }
                if parts.peek().is_some() {
                    next.push((value.clone(), true));
                }
            }
        }
        segments = next;
    }

    segments.into_iter().map(|(segment, _)| segment).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, MemoryCatalogProvider};
    use serde_json::{json, Map};

    fn entry(code: u64, text: &str) -> CatalogEntry {
        let mut message = IndexMap::new();
        message.insert("en".to_string(), text.to_string());
        CatalogEntry {
            response_code: json!(code),
            response_message: message,
            extra: Map::new(),
        }
    }

    fn renderer(provider: MemoryCatalogProvider) -> Renderer {
        Renderer::new(Arc::new(provider), "en", OutputTemplate::Structured).unwrap()
    }

    fn structured(rendered: Rendered) -> ResponseEnvelope {
        match rendered {
            Rendered::Structured(envelope) => envelope,
            other => panic!("expected structured output, got {other:?}"),
        }
    }

    fn no_options() -> IndexMap<String, String> {
        IndexMap::new()
    }

    #[test]
    fn test_base_catalog_parses_and_covers_framework_codes() {
        let base = Catalog::from_json_str(BASE_CATALOG).unwrap();
        for code in [
            codes::SUCCESS,
            codes::UNKNOWN_ERROR,
            codes::ENCRYPTION_STATE_STRICTLY_ENABLED,
            codes::METHOD_NOT_LOADED,
            codes::INVALID_REQUEST_METHOD,
            codes::INVALID_INPUT_EMPTY,
            codes::RESPONSE_CODE_NOT_FOUND,
        ] {
            assert!(base.get(code).is_some(), "missing base entry: {code}");
        }
    }

    #[test]
    fn test_base_overrides_project_entry() {
        let mut project = Catalog::new();
        project.insert(codes::SUCCESS, entry(299, "project success"));
        let renderer = renderer(MemoryCatalogProvider::new(project));

        let envelope = structured(
            renderer
                .render(codes::SUCCESS, &no_options(), None, None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_code, json!(200));
        assert_eq!(envelope.response_message, "Success.");
    }

    #[test]
    fn test_package_overrides_project_and_base() {
        let mut project = Catalog::new();
        project.insert("GREETING", entry(200, "project greeting"));
        let mut package = Catalog::new();
        package.insert("GREETING", entry(200, "package greeting"));
        package.insert(codes::SUCCESS, entry(200, "package success"));
        let renderer = renderer(
            MemoryCatalogProvider::new(project).with_package("billing", package),
        );

        let envelope = structured(
            renderer
                .render("GREETING", &no_options(), Some("billing"), None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "package greeting");

        let envelope = structured(
            renderer
                .render(codes::SUCCESS, &no_options(), Some("billing"), None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "package success");
    }

    #[test]
    fn test_missing_package_catalog_contributes_nothing() {
        let mut project = Catalog::new();
        project.insert("GREETING", entry(200, "project greeting"));
        let renderer = renderer(MemoryCatalogProvider::new(project));

        let envelope = structured(
            renderer
                .render("GREETING", &no_options(), Some("unknown"), None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "project greeting");
    }

    #[test]
    fn test_language_falls_back_to_default() {
        let mut message = IndexMap::new();
        message.insert("en".to_string(), "english".to_string());
        message.insert("fr".to_string(), "français".to_string());
        let mut project = Catalog::new();
        project.insert(
            "GREETING",
            CatalogEntry {
                response_code: json!(200),
                response_message: message,
                extra: Map::new(),
            },
        );
        let renderer = renderer(MemoryCatalogProvider::new(project));

        let envelope = structured(
            renderer
                .render("GREETING", &no_options(), None, Some("fr"), Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "français");

        let envelope = structured(
            renderer
                .render("GREETING", &no_options(), None, Some("de"), Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "english");
    }

    #[test]
    fn test_unknown_code_uses_sentinel() {
        let renderer = renderer(MemoryCatalogProvider::default());
        let envelope = structured(
            renderer
                .render("NO_SUCH_CODE", &no_options(), None, None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_code, json!(500));
        assert_eq!(
            envelope.response_message,
            "No response entry is defined for this result."
        );
    }

    #[test]
    fn test_option_substitution_in_order() {
        let mut project = Catalog::new();
        project.insert("SHAPED", entry(400, "{a} then {b}"));
        let renderer = renderer(MemoryCatalogProvider::new(project));

        let mut options = IndexMap::new();
        options.insert("a".to_string(), "first".to_string());
        options.insert("b".to_string(), "second".to_string());
        let envelope = structured(
            renderer
                .render("SHAPED", &options, None, None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "first then second");
    }

    #[test]
    fn test_substituted_text_is_not_reprocessed() {
        // The value for "a" contains "{b}", which must survive literally.
        let mut project = Catalog::new();
        project.insert("SHAPED", entry(400, "{a} / {b}"));
        let renderer = renderer(MemoryCatalogProvider::new(project));

        let mut options = IndexMap::new();
        options.insert("a".to_string(), "literal {b}".to_string());
        options.insert("b".to_string(), "value".to_string());
        let envelope = structured(
            renderer
                .render("SHAPED", &options, None, None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(envelope.response_message, "literal {b} / value");
    }

    #[test]
    fn test_param_name_substitution_in_base_message() {
        let renderer = renderer(MemoryCatalogProvider::default());
        let mut options = IndexMap::new();
        options.insert("paramName".to_string(), "email".to_string());
        let envelope = structured(
            renderer
                .render(codes::INVALID_INPUT_EMPTY, &options, None, None, Value::Null, None)
                .unwrap(),
        );
        assert_eq!(
            envelope.response_message,
            "The parameter email is missing or empty."
        );
    }

    #[test]
    fn test_debug_message_serialization_is_conditional() {
        let envelope = ResponseEnvelope {
            response_code: json!(200),
            response_message: "Success.".to_string(),
            response_data: Value::Null,
            debug_message: None,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("debugMessage").is_none());

        let envelope = ResponseEnvelope {
            debug_message: Some("boom".to_string()),
            ..envelope
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["debugMessage"], "boom");
    }
}
