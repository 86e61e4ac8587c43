//! ApiEvent - one captured request/response pair
//!
//! Bodies stay as JSON text until a handler asks for them, so handlers that
//! forward the raw response never pay for a parse.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{CommandName, ContractError};

/// Untyped JSON object
pub type JsonObject = Map<String, Value>;

/// Captured API event as delivered by the proxy transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEvent {
    /// Command name
    pub command: CommandName,

    /// JSON-encoded request body
    #[serde(with = "arc_str")]
    pub request: Arc<str>,

    /// JSON-encoded response body
    #[serde(with = "arc_str")]
    pub response: Arc<str>,
}

/// Both bodies of an event parsed to JSON objects
#[derive(Debug, Clone, Default)]
pub struct DecodedEvent {
    pub request: JsonObject,
    pub response: JsonObject,
}

impl ApiEvent {
    pub fn new(
        command: impl Into<CommandName>,
        request: impl Into<Arc<str>>,
        response: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            command: command.into(),
            request: request.into(),
            response: response.into(),
        }
    }

    /// Parse the request body
    pub fn decode_request(&self) -> Result<JsonObject, ContractError> {
        self.decode_part("request", &self.request)
    }

    /// Parse the response body
    pub fn decode_response(&self) -> Result<JsonObject, ContractError> {
        self.decode_part("response", &self.response)
    }

    /// Parse both bodies, request first
    pub fn decode(&self) -> Result<DecodedEvent, ContractError> {
        Ok(DecodedEvent {
            request: self.decode_request()?,
            response: self.decode_response()?,
        })
    }

    fn decode_part(&self, part: &'static str, body: &str) -> Result<JsonObject, ContractError> {
        let value: Value =
            serde_json::from_str(body).map_err(|source| ContractError::Deserialization {
                command: self.command.to_string(),
                part,
                source,
            })?;

        match value {
            Value::Object(map) => Ok(map),
            other => Err(ContractError::Deserialization {
                command: self.command.to_string(),
                part,
                source: serde_json::Error::custom(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )),
            }),
        }
    }
}

impl DecodedEvent {
    /// Wizard id of the session that produced the event.
    ///
    /// Looks at `request.wizard_id`, then `response.wizard_id`, then
    /// `response.wizard_info.wizard_id`.
    pub fn wizard_id(&self) -> Option<i64> {
        self.request
            .get("wizard_id")
            .and_then(as_id)
            .or_else(|| self.response.get("wizard_id").and_then(as_id))
            .or_else(|| {
                self.response
                    .get("wizard_info")
                    .and_then(|info| info.get("wizard_id"))
                    .and_then(as_id)
            })
    }
}

/// Numeric id as i64; accepts float encodings of integral values
pub fn as_id(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

/// Decode a typed view of `value`, naming `at` in the validation error
pub fn decode_view<T: DeserializeOwned>(value: &Value, at: &str) -> Result<T, ContractError> {
    T::deserialize(value).map_err(|e| ContractError::validation(at, e.to_string()))
}

/// Short name of a JSON value's type, for error messages
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

mod arc_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<str>, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_objects() {
        let event = ApiEvent::new("Cmd", r#"{"a":1}"#, r#"{"b":2}"#);
        let decoded = event.decode().unwrap();
        assert_eq!(decoded.request["a"], json!(1));
        assert_eq!(decoded.response["b"], json!(2));
    }

    #[test]
    fn test_decode_malformed_request() {
        let event = ApiEvent::new("Cmd", "{not json", "{}");
        let err = event.decode().unwrap_err();
        assert!(matches!(
            err,
            ContractError::Deserialization {
                part: "request",
                ..
            }
        ));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let event = ApiEvent::new("Cmd", "{}", "[1,2]");
        let err = event.decode().unwrap_err();
        assert!(err.to_string().contains("expected a JSON object, found array"));
    }

    #[test]
    fn test_wizard_id_lookup_order() {
        let mut decoded = DecodedEvent::default();
        assert_eq!(decoded.wizard_id(), None);

        decoded.response = json!({"wizard_info": {"wizard_id": 3}})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(decoded.wizard_id(), Some(3));

        decoded.response.insert("wizard_id".into(), json!(2));
        assert_eq!(decoded.wizard_id(), Some(2));

        decoded.request.insert("wizard_id".into(), json!(1.0));
        assert_eq!(decoded.wizard_id(), Some(1));
    }

    #[test]
    fn test_wizard_id_ignores_strings() {
        let decoded = DecodedEvent {
            request: json!({"wizard_id": "7"}).as_object().cloned().unwrap(),
            response: JsonObject::new(),
        };
        assert_eq!(decoded.wizard_id(), None);
    }

    #[test]
    fn test_event_serde_keeps_text_bodies() {
        let event = ApiEvent::new("Cmd", r#"{"a":1}"#, "{}");
        let json = serde_json::to_string(&event).unwrap();
        let back: ApiEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.command, "Cmd");
        assert_eq!(&*back.request, r#"{"a":1}"#);
    }
}
