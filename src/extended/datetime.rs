use super::ExtendCodec;
use crate::error::{SchemaError, SchemaResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Date-time values, exchanged as RFC 3339 text.
///
/// Decoding also takes a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare
/// date (midnight UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCodec;

impl ExtendCodec for DateTimeCodec {
    fn type_name(&self) -> &str {
        "datetime"
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::DateTime(_))
    }

    fn encode(&self, value: &Value) -> SchemaResult<serde_json::Value> {
        match value {
            Value::DateTime(dt) => Ok(serde_json::Value::String(
                dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            )),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(SchemaError::type_mismatch("Must be a extend type", "")
                .with("type", "datetime")
                .with("value", other.clone())),
        }
    }

    fn decode(&self, raw: &str) -> Result<Value, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Value::DateTime(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Value::DateTime(naive.and_utc()));
        }
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Value::DateTime(naive.and_utc()))
                .ok_or_else(|| format!("invalid date '{raw}'")),
            Err(e) => Err(format!("invalid isoformat string '{raw}': {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_forms() {
        let codec = DateTimeCodec;
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(codec.decode("2020-01-01").unwrap(), Value::DateTime(expected));
        assert_eq!(
            codec.decode("2020-01-01T00:00:00").unwrap(),
            Value::DateTime(expected)
        );
        assert_eq!(
            codec.decode("2020-01-01T01:00:00+01:00").unwrap(),
            Value::DateTime(expected)
        );
        assert!(codec.decode("first of january").is_err());
    }

    #[test]
    fn test_encode() {
        let codec = DateTimeCodec;
        let dt = Utc.with_ymd_and_hms(2021, 6, 2, 10, 30, 0).unwrap();
        assert_eq!(
            codec.encode(&Value::DateTime(dt)).unwrap(),
            serde_json::json!("2021-06-02T10:30:00+00:00")
        );
        assert!(codec.encode(&Value::Int(3)).is_err());
    }
}
