//! Decoding of telemetry message payloads.

use serde_json::{Map, Value};

use crate::error::MqttError;

/// Decode a message payload into the JSON object the pipeline consumes.
pub fn decode_payload(bytes: &[u8]) -> Result<Map<String, Value>, MqttError> {
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(MqttError::NotAnObject("array")),
        Value::String(_) => Err(MqttError::NotAnObject("string")),
        Value::Number(_) => Err(MqttError::NotAnObject("number")),
        Value::Bool(_) => Err(MqttError::NotAnObject("boolean")),
        Value::Null => Err(MqttError::NotAnObject("null")),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn object_payload_is_decoded() {
        let map = decode_payload(br#"{"pH": 7.1, "TDS": "410"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["pH"], 7.1);
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert_matches!(decode_payload(b"pH=7.1"), Err(MqttError::InvalidJson(_)));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert_matches!(decode_payload(b"[7.1, 250]"), Err(MqttError::NotAnObject("array")));
        assert_matches!(decode_payload(b"null"), Err(MqttError::NotAnObject("null")));
    }
}
