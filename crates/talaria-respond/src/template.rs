//! Typed output templates.
//!
//! The default template is a structured passthrough of the response
//! envelope. A project may instead supply a text template with `{field}`
//! placeholders; string fields interpolate verbatim while any other field
//! interpolates as raw inline JSON, and the templated text can optionally
//! be re-parsed into structured data. A template referencing an unknown
//! field, or a re-parse of non-JSON output, is a fatal rendering error.

use serde_json::Value;
use thiserror::Error;

use talaria_core::{DispatchError, ResponseTemplateConfig};

use crate::renderer::ResponseEnvelope;

/// Errors produced while loading catalogs or compiling templates.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A catalog file could not be read.
    #[error("catalog load failed: {0}")]
    CatalogLoad(String),

    /// A catalog file could not be parsed.
    #[error("catalog parse failed: {0}")]
    CatalogParse(String),

    /// An entry has no text for the caller's or the default language.
    #[error("entry '{code}' has no message for language '{language}'")]
    MissingMessage {
        /// The response-code string.
        code: String,
        /// The default language that was also missing.
        language: String,
    },

    /// The template references a field the envelope does not have.
    #[error("unknown template field: {0}")]
    UnknownTemplateField(String),

    /// The templated output could not be re-parsed into structured data.
    #[error("template output is not valid JSON: {0}")]
    OutputParse(String),
}

impl From<RenderError> for DispatchError {
    fn from(error: RenderError) -> Self {
        Self::render(error.to_string())
    }
}

/// The final externally-visible value.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// The structured passthrough envelope.
    Structured(ResponseEnvelope),
    /// Custom-template output re-parsed into structured data.
    Json(Value),
    /// Custom-template output kept as a raw string.
    Text(String),
}

/// How the final response is compiled.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTemplate {
    /// Structured passthrough of the envelope (the default).
    Structured,
    /// Text template with `{field}` placeholders.
    Text {
        /// The template text.
        template: String,
        /// Re-parse the output into structured data.
        reparse: bool,
    },
}

impl OutputTemplate {
    /// Builds the template selection from process-wide configuration.
    #[must_use]
    pub fn from_config(config: &ResponseTemplateConfig) -> Self {
        match &config.text {
            Some(template) => Self::Text {
                template: template.clone(),
                reparse: config.reparse_output,
            },
            None => Self::Structured,
        }
    }

    /// Compiles the envelope through this template.
    pub fn compile(&self, envelope: ResponseEnvelope) -> Result<Rendered, RenderError> {
        match self {
            Self::Structured => Ok(Rendered::Structured(envelope)),
            Self::Text { template, reparse } => {
                let text = interpolate(template, &envelope)?;
                if *reparse {
                    let value = serde_json::from_str(&text)
                        .map_err(|e| RenderError::OutputParse(e.to_string()))?;
                    Ok(Rendered::Json(value))
                } else {
                    Ok(Rendered::Text(text))
                }
            }
        }
    }
}

/// Substitutes `{field}` placeholders in a template.
///
/// A `{` that does not open a well-formed field placeholder is literal
/// text, so JSON-shaped templates need no escaping.
fn interpolate(template: &str, envelope: &ResponseEnvelope) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if is_field_name(&after[..end]) => {
                out.push_str(&field_text(envelope, &after[..end])?);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Renders one envelope field for interpolation.
///
/// Strings interpolate verbatim; everything else interpolates as raw
/// inline JSON. This is the explicit escape hatch that replaces marker
/// tricks for embedding objects inside text templates.
fn field_text(envelope: &ResponseEnvelope, name: &str) -> Result<String, RenderError> {
    let value = match name {
        "responseCode" => envelope.response_code.clone(),
        "responseMessage" => Value::String(envelope.response_message.clone()),
        "responseData" => envelope.response_data.clone(),
        "debugMessage" => Value::String(envelope.debug_message.clone().unwrap_or_default()),
        other => return Err(RenderError::UnknownTemplateField(other.to_string())),
    };
    Ok(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope() -> ResponseEnvelope {
        ResponseEnvelope {
            response_code: json!(200),
            response_message: "Success.".to_string(),
            response_data: json!({ "items": [1, 2] }),
            debug_message: None,
        }
    }

    #[test]
    fn test_structured_passthrough() {
        let rendered = OutputTemplate::Structured.compile(envelope()).unwrap();
        assert!(matches!(rendered, Rendered::Structured(_)));
    }

    #[test]
    fn test_text_template_stays_text() {
        let template = OutputTemplate::Text {
            template: "<response><code>{responseCode}</code><msg>{responseMessage}</msg></response>"
                .to_string(),
            reparse: false,
        };
        let rendered = template.compile(envelope()).unwrap();
        assert_eq!(
            rendered,
            Rendered::Text(
                "<response><code>200</code><msg>Success.</msg></response>".to_string()
            )
        );
    }

    #[test]
    fn test_json_template_reparse_inlines_objects() {
        let template = OutputTemplate::Text {
            template: r#"{"code": {responseCode}, "message": "{responseMessage}", "data": {responseData}}"#
                .to_string(),
            reparse: true,
        };
        let rendered = template.compile(envelope()).unwrap();
        assert_eq!(
            rendered,
            Rendered::Json(json!({
                "code": 200,
                "message": "Success.",
                "data": { "items": [1, 2] }
            }))
        );
    }

    #[test]
    fn test_unknown_field_is_fatal() {
        let template = OutputTemplate::Text {
            template: "{nonsense}".to_string(),
            reparse: false,
        };
        assert!(matches!(
            template.compile(envelope()),
            Err(RenderError::UnknownTemplateField(_))
        ));
    }

    #[test]
    fn test_reparse_failure_is_fatal() {
        let template = OutputTemplate::Text {
            template: "plain text, not json".to_string(),
            reparse: true,
        };
        assert!(matches!(
            template.compile(envelope()),
            Err(RenderError::OutputParse(_))
        ));
    }

    #[test]
    fn test_braces_without_field_are_literal() {
        let template = OutputTemplate::Text {
            template: "{not a field} {responseMessage}".to_string(),
            reparse: false,
        };
        let rendered = template.compile(envelope()).unwrap();
        assert_eq!(rendered, Rendered::Text("{not a field} Success.".to_string()));
    }
}
