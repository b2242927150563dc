use super::ExtendCodec;
use crate::error::{SchemaError, SchemaResult};
use crate::value::Value;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Byte blobs, exchanged as standard base64 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl ExtendCodec for BytesCodec {
    fn type_name(&self) -> &str {
        "bytes"
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }

    fn encode(&self, value: &Value) -> SchemaResult<serde_json::Value> {
        match value {
            Value::Bytes(b) => Ok(serde_json::Value::String(STANDARD.encode(b))),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(SchemaError::type_mismatch("Must be a extend type", "")
                .with("type", "bytes")
                .with("value", other.clone())),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, String> {
        STANDARD
            .decode(raw)
            .map(Value::Bytes)
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_both_ways() {
        let codec = BytesCodec;
        let value = codec.decode("aGVsbG8=").unwrap();
        assert_eq!(value, Value::Bytes(b"hello".to_vec()));
        assert_eq!(codec.encode(&value).unwrap(), serde_json::json!("aGVsbG8="));
        assert!(codec.decode("not base64!").is_err());
    }
}
