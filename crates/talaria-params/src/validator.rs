//! Per-parameter validation and coercion.

use serde_json::{Number, Value};
use talaria_core::{codes, DispatchError, ParameterDefinition, ParameterKind};
use thiserror::Error;

/// A parameter that failed validation, carrying the offending name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {parameter}")]
pub struct ValidationFailure {
    /// The response code for this failure.
    pub code: String,
    /// The offending parameter name.
    pub parameter: String,
}

impl ValidationFailure {
    fn empty(parameter: &str) -> Self {
        Self {
            code: codes::INVALID_INPUT_EMPTY.to_string(),
            parameter: parameter.to_string(),
        }
    }
}

impl From<ValidationFailure> for DispatchError {
    fn from(failure: ValidationFailure) -> Self {
        Self::validation(failure.code, failure.parameter)
    }
}

/// Validates one parameter definition against a raw value.
///
/// Runs the three checks in order: required, type coercion, default
/// substitution. Returns the coerced value, or `None` when the parameter is
/// absent and carries no default.
///
/// Rules:
/// - a required parameter that is absent, an empty string, or NaN fails
///   with `INVALID_INPUT_EMPTY`; an absent required parameter with a
///   non-empty default is satisfied by that default
/// - a present-but-empty string fails regardless of the declared type
/// - `number` parameters accept numbers and numeric strings; any other
///   non-empty input fails
/// - the default applies only when the value is absent, never overriding an
///   explicit value (explicit falsy values included)
pub fn validate(
    definition: &ParameterDefinition,
    raw: Option<&Value>,
) -> Result<Option<Value>, ValidationFailure> {
    verify_required(definition, raw)?;

    let coerced = match raw {
        None | Some(Value::Null) => None,
        Some(value) => Some(coerce(definition, value)?),
    };

    Ok(match coerced {
        Some(value) => Some(value),
        None => default_value(definition),
    })
}

fn verify_required(
    definition: &ParameterDefinition,
    raw: Option<&Value>,
) -> Result<(), ValidationFailure> {
    if !definition.required {
        return Ok(());
    }

    let empty = match raw {
        None | Some(Value::Null) => !has_default(definition),
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(f64::is_nan),
        Some(_) => false,
    };

    if empty {
        return Err(ValidationFailure::empty(&definition.name));
    }
    Ok(())
}

fn coerce(definition: &ParameterDefinition, value: &Value) -> Result<Value, ValidationFailure> {
    // A present-but-empty string is an error whatever the declared type.
    if matches!(value, Value::String(s) if s.is_empty()) {
        return Err(ValidationFailure::empty(&definition.name));
    }

    match definition.kind {
        ParameterKind::Number => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => parse_number(s)
                .map(Value::Number)
                .ok_or_else(|| ValidationFailure::empty(&definition.name)),
            _ => Err(ValidationFailure::empty(&definition.name)),
        },
        ParameterKind::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(ValidationFailure::empty(&definition.name)),
        },
        // File payloads pass through untouched.
        ParameterKind::File => Ok(value.clone()),
    }
}

fn default_value(definition: &ParameterDefinition) -> Option<Value> {
    let default = definition.default.as_deref()?.trim();
    if default.is_empty() {
        return None;
    }
    match definition.kind {
        ParameterKind::Number => parse_number(default).map(Value::Number),
        _ => Some(Value::String(default.to_string())),
    }
}

fn has_default(definition: &ParameterDefinition) -> bool {
    definition
        .default
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty())
}

fn parse_number(input: &str) -> Option<Number> {
    let trimmed = input.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}
