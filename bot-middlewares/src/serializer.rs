//! Resolves and applies the structured encoding of an event.

use serde_json::Value;

use crate::error::LogError;
use crate::registry::{Encoding, Loggable};

/// Encoder for one concrete type, obtained from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serializer {
    label: &'static str,
    encoding: Encoding,
}

/// Look up the encoding registered for the event's type.
pub fn resolve<T: Loggable + ?Sized>(event: &T) -> Result<Serializer, LogError> {
    let descriptor = event.descriptor();
    descriptor
        .encoding
        .map(|encoding| Serializer { label: descriptor.label, encoding })
        .ok_or_else(|| LogError::unregistered(descriptor.label))
}

impl Serializer {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn encode<T: Loggable + ?Sized>(&self, event: &T) -> Result<String, LogError> {
        let payload = match event.payload() {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                return Err(LogError::Serialization {
                    type_name: self.label.to_string(),
                    reason: e.to_string(),
                });
            }
            None => {
                return Err(LogError::Serialization {
                    type_name: self.label.to_string(),
                    reason: "binary payload".to_string(),
                });
            }
        };

        let encoded = match self.encoding {
            Encoding::Full => payload,
            Encoding::Compact => strip_nulls(payload),
        };
        Ok(encoded.to_string())
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bot_api_types::requests::SendMessage;
    use bot_api_types::{ApiCall, ApiResponse, Update};
    use serde_json::json;

    fn send_text() -> ApiCall {
        ApiCall::SendTextMessage(SendMessage {
            chat_id: 42,
            text: "hello".to_string(),
            parse_mode: None,
            disable_notification: false,
            reply_to_message_id: None,
            reply_markup: None,
        })
    }

    #[test]
    fn test_request_keeps_nulls() {
        let call = send_text();
        let serializer = resolve(&call).unwrap();
        assert_eq!(serializer.label(), "SendTextMessage");
        assert_eq!(serializer.encoding(), Encoding::Full);

        let data: Value = serde_json::from_str(&serializer.encode(&call).unwrap()).unwrap();
        assert_eq!(data["chat_id"], json!(42));
        assert!(data.as_object().unwrap().contains_key("parse_mode"));
    }

    #[test]
    fn test_result_drops_nulls() {
        let response = ApiResponse::Json(json!({"a": null, "b": [{"c": null, "d": 1}]}));
        let serializer = resolve(&response).unwrap();
        assert_eq!(serializer.encode(&response).unwrap(), r#"{"b":[{"d":1}]}"#);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let call = send_text();
        let first = resolve(&call).unwrap();
        let second = resolve(&call).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.encode(&call).unwrap(), second.encode(&call).unwrap());
    }

    #[test]
    fn test_unknown_update_has_no_serializer() {
        let update: Update =
            serde_json::from_value(json!({"update_id": 1, "mystery": {"x": 1}})).unwrap();
        match resolve(&update) {
            Err(LogError::Serialization { type_name, .. }) => assert_eq!(type_name, "UnknownUpdate"),
            other => panic!("expected serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_has_no_serializer() {
        let bytes = ApiResponse::Bytes(vec![1, 2, 3]);
        assert!(resolve(&bytes).is_err());
    }
}
