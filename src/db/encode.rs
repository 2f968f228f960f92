//! Conversions between domain values and SQLite column values.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` UTC text, the same shape
//! SQLite's `CURRENT_TIMESTAMP` produces.

use chrono::NaiveDateTime;
use rusqlite::types::{Type, Value};

use crate::models::Area;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn encode_timestamp(ts: NaiveDateTime) -> Value {
    Value::Text(ts.format(TIMESTAMP_FORMAT).to_string())
}

/// Decode a timestamp column, reporting failures against column `idx`
pub fn decode_timestamp(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub fn encode_area(area: Option<&Area>) -> Value {
    match area {
        Some(Area::Integer(v)) => Value::Integer(*v),
        Some(Area::Real(v)) => Value::Real(*v),
        Some(Area::Text(v)) => Value::Text(v.clone()),
        None => Value::Null,
    }
}

pub fn decode_area(idx: usize, value: Value) -> rusqlite::Result<Option<Area>> {
    match value {
        Value::Null => Ok(None),
        Value::Integer(v) => Ok(Some(Area::Integer(v))),
        Value::Real(v) => Ok(Some(Area::Real(v))),
        Value::Text(v) => Ok(Some(Area::Text(v))),
        Value::Blob(_) => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "area".to_string(),
            Type::Blob,
        )),
    }
}

pub fn encode_opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_shape() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(encode_timestamp(ts), Value::Text("2024-03-09 07:05:01".to_string()));
        assert_eq!(decode_timestamp(0, "2024-03-09 07:05:01").unwrap(), ts);
    }

    #[test]
    fn test_decode_timestamp_rejects_rfc3339() {
        assert!(decode_timestamp(2, "2024-03-09T07:05:01Z").is_err());
    }

    #[test]
    fn test_area_keeps_storage_class() {
        assert_eq!(encode_area(Some(&Area::Integer(42))), Value::Integer(42));
        assert_eq!(encode_area(None), Value::Null);
        assert_eq!(
            decode_area(0, Value::Text("12.5 km2".to_string())).unwrap(),
            Some(Area::Text("12.5 km2".to_string()))
        );
        assert!(decode_area(0, Value::Blob(vec![1])).is_err());
    }
}
