//! Request metadata collection.

use serde_json::{Map, Value};

use talaria_core::{Envelope, MetadataSchema};

/// Collects the configured metadata fields from the envelope.
///
/// Each schema entry maps a metadata key to an envelope field name; fields
/// the envelope does not carry come through as `null` so the metadata
/// object always has the configured shape. An absent or empty schema
/// yields no metadata at all.
#[must_use]
pub fn collect(schema: Option<&MetadataSchema>, envelope: &Envelope) -> Option<Value> {
    let schema = schema.filter(|s| !s.is_empty())?;

    let mut object = Map::new();
    for (key, field_name) in &schema.0 {
        let value = envelope.field(field_name).cloned().unwrap_or(Value::Null);
        object.insert(key.clone(), value);
    }
    Some(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use indexmap::IndexMap;
    use serde_json::json;
    use talaria_core::EventKind;

    fn schema(pairs: &[(&str, &str)]) -> MetadataSchema {
        let mut map = IndexMap::new();
        for (key, field) in pairs {
            map.insert((*key).to_string(), (*field).to_string());
        }
        MetadataSchema(map)
    }

    #[test]
    fn test_no_schema_means_no_metadata() {
        let envelope = Envelope::new(Method::GET, EventKind::Http, "ping");
        assert!(collect(None, &envelope).is_none());
        assert!(collect(Some(&schema(&[])), &envelope).is_none());
    }

    #[test]
    fn test_collects_fields_in_schema_order() {
        let envelope = Envelope::new(Method::GET, EventKind::Http, "ping")
            .with_field("user-agent", json!("talaria-test"))
            .with_field("x-device", json!("ios"));
        let schema = schema(&[("device", "x-device"), ("agent", "user-agent")]);
        let metadata = collect(Some(&schema), &envelope).unwrap();
        assert_eq!(metadata, json!({ "device": "ios", "agent": "talaria-test" }));
    }

    #[test]
    fn test_missing_field_is_null() {
        let envelope = Envelope::new(Method::GET, EventKind::Http, "ping");
        let schema = schema(&[("device", "x-device")]);
        let metadata = collect(Some(&schema), &envelope).unwrap();
        assert_eq!(metadata, json!({ "device": null }));
    }
}
