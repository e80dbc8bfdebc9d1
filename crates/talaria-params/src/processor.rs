//! Parameter set processing.
//!
//! Filters an incoming data bag down to the declared schema, trims string
//! values, and drives the validator over each declared parameter in
//! schema-declaration order. Processing stops at the first error so error
//! reporting is deterministic.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use talaria_core::ParameterDefinition;

use crate::validator::{validate, ValidationFailure};

/// Processes a raw data bag against a declared parameter schema.
///
/// - keys not declared in the schema are dropped (over-posting defense)
/// - string values are trimmed before validation
/// - declared parameters validate in declaration order; the first failure
///   aborts the whole set
///
/// Returns the validated values keyed by declared name; absent optional
/// parameters without defaults are simply not present in the result.
pub fn process(
    schema: &IndexMap<String, ParameterDefinition>,
    raw: &Value,
) -> Result<IndexMap<String, Value>, ValidationFailure> {
    let bag = filter_and_trim(schema, raw);

    let mut validated = IndexMap::new();
    for (declared_name, definition) in schema {
        let value = validate(definition, bag.get(&definition.name))?;
        if let Some(value) = value {
            validated.insert(declared_name.clone(), value);
        }
    }
    Ok(validated)
}

/// Drops undeclared keys and trims string values.
fn filter_and_trim(
    schema: &IndexMap<String, ParameterDefinition>,
    raw: &Value,
) -> Map<String, Value> {
    let Some(object) = raw.as_object() else {
        return Map::new();
    };

    object
        .iter()
        .filter(|(key, _)| schema.values().any(|def| &def.name == *key))
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use talaria_core::{codes, ParameterKind};

    fn schema(defs: Vec<ParameterDefinition>) -> IndexMap<String, ParameterDefinition> {
        defs.into_iter().map(|d| (d.name.clone(), d)).collect()
    }

    #[test]
    fn test_undeclared_keys_are_dropped() {
        let schema = schema(vec![ParameterDefinition::new("name", ParameterKind::String)]);
        let raw = json!({ "name": "ada", "role": "admin" });
        let validated = process(&schema, &raw).unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated["name"], "ada");
    }

    #[test]
    fn test_string_values_are_trimmed() {
        let schema = schema(vec![ParameterDefinition::new("name", ParameterKind::String)]);
        let raw = json!({ "name": "  ada  " });
        let validated = process(&schema, &raw).unwrap();
        assert_eq!(validated["name"], "ada");
    }

    #[test]
    fn test_first_error_short_circuits_in_declaration_order() {
        let schema = schema(vec![
            ParameterDefinition::required("first", ParameterKind::String),
            ParameterDefinition::required("second", ParameterKind::String),
        ]);
        // Both parameters are missing; the error must name the first one.
        let err = process(&schema, &json!({})).unwrap_err();
        assert_eq!(err.parameter, "first");
        assert_eq!(err.code, codes::INVALID_INPUT_EMPTY);
    }

    #[test]
    fn test_whitespace_only_required_value_fails() {
        let schema = schema(vec![ParameterDefinition::required(
            "name",
            ParameterKind::String,
        )]);
        let err = process(&schema, &json!({ "name": "   " })).unwrap_err();
        assert_eq!(err.parameter, "name");
    }

    #[test]
    fn test_mixed_set_validates_and_defaults() {
        let schema = schema(vec![
            ParameterDefinition::required("quantity", ParameterKind::Number),
            ParameterDefinition::new("page", ParameterKind::Number).with_default("1"),
            ParameterDefinition::new("note", ParameterKind::String),
        ]);
        let validated = process(&schema, &json!({ "quantity": "3" })).unwrap();
        assert_eq!(validated["quantity"], json!(3));
        assert_eq!(validated["page"], json!(1));
        assert!(!validated.contains_key("note"));
    }

    #[test]
    fn test_non_object_bag_treated_as_empty() {
        let schema = schema(vec![ParameterDefinition::new(
            "page",
            ParameterKind::Number,
        )
        .with_default("1")]);
        let validated = process(&schema, &json!("not an object")).unwrap();
        assert_eq!(validated["page"], json!(1));
    }
}
