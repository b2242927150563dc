use super::ExtendCodec;
use crate::error::{SchemaError, SchemaResult};
use crate::value::Value;

/// Free form map with no declared fields; text input is parsed as a JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeMapCodec;

impl ExtendCodec for FreeMapCodec {
    fn type_name(&self) -> &str {
        "free_map"
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn encode(&self, value: &Value) -> SchemaResult<serde_json::Value> {
        match value {
            Value::Map(_) | Value::Null => Ok(value.to_json()),
            other => Err(SchemaError::type_mismatch("Must be a extend type", "")
                .with("type", "free_map")
                .with("value", other.clone())),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, String> {
        let json: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        if json.is_object() {
            Ok(Value::from_json(&json))
        } else {
            Err(format!("expected a JSON object, got '{raw}'"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_object_only() {
        let codec = FreeMapCodec;
        assert_eq!(
            codec.decode(r#"{"a": 1}"#).unwrap(),
            Value::map([("a", 1)])
        );
        assert!(codec.decode("[1, 2]").is_err());
        assert!(codec.decode("{").is_err());
    }
}
