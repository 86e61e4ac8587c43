//! PayloadProjector - keep only schema-approved fields

use contracts::{DecodedEvent, JsonObject};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::SchemaEntry;

/// Direction -> approved field -> value (null when absent in the event)
pub type UploadPayload = BTreeMap<String, JsonObject>;

/// Build the upload payload for one event.
///
/// Only directions named in `entry` appear. Within a direction every
/// approved field is present, taken from the event or set to null. Fields
/// the schema does not name are dropped.
pub fn project(entry: Option<&SchemaEntry>, raw: &DecodedEvent) -> UploadPayload {
    let Some(entry) = entry else {
        return UploadPayload::new();
    };

    entry
        .iter()
        .map(|(direction, fields)| {
            let source = raw_direction(raw, direction);
            let projected = fields
                .iter()
                .map(|field| {
                    let value = source
                        .and_then(|s| s.get(field))
                        .cloned()
                        .unwrap_or(Value::Null);
                    (field.clone(), value)
                })
                .collect();
            (direction.clone(), projected)
        })
        .collect()
}

fn raw_direction<'a>(raw: &'a DecodedEvent, direction: &str) -> Option<&'a JsonObject> {
    match direction {
        "request" => Some(&raw.request),
        "response" => Some(&raw.response),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn entry(value: Value) -> SchemaEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_project_selects_and_nulls() {
        let entry = entry(json!({"request": ["a"], "response": ["b"]}));
        let raw = DecodedEvent {
            request: object(json!({"a": 1, "c": 2})),
            response: JsonObject::new(),
        };

        let payload = project(Some(&entry), &raw);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"request": {"a": 1}, "response": {"b": null}})
        );
    }

    #[test]
    fn test_missing_direction_is_omitted() {
        let entry = entry(json!({"response": ["unit_list"]}));
        let raw = DecodedEvent {
            request: object(json!({"wizard_id": 1})),
            response: object(json!({"unit_list": [1, 2], "extra": true})),
        };

        let payload = project(Some(&entry), &raw);

        assert!(!payload.contains_key("request"));
        assert_eq!(payload["response"].len(), 1);
        assert_eq!(payload["response"]["unit_list"], json!([1, 2]));
    }

    #[test]
    fn test_empty_or_absent_entry_yields_empty_payload() {
        let raw = DecodedEvent {
            request: object(json!({"a": 1})),
            response: object(json!({"b": 2})),
        };
        assert!(project(None, &raw).is_empty());
        assert!(project(Some(&SchemaEntry::new()), &raw).is_empty());
    }

    #[test]
    fn test_direction_with_no_fields_is_empty_object() {
        let entry = entry(json!({"request": []}));
        let payload = project(Some(&entry), &DecodedEvent::default());
        assert_eq!(serde_json::to_value(&payload).unwrap(), json!({"request": {}}));
    }
}
