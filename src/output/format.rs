//! Value formatting seam
//!
//! Converts a typed record value into something the destination can store.

use serde::Serialize;

use crate::schema::{ColumnType, Value};

/// Timestamp rendering used by `DefaultFormatter`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f UTC";

/// A destination-storable cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// True for blank cells, including empty text
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Formats record values for the destination
pub trait ValueFormatter {
    fn format_value(&self, column_type: ColumnType, value: &Value, null_representation: &str) -> CellValue;
}

/// Formatter used when the host supplies none
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl ValueFormatter for DefaultFormatter {
    fn format_value(&self, _column_type: ColumnType, value: &Value, null_representation: &str) -> CellValue {
        match value {
            Value::Null => CellValue::Text(null_representation.to_string()),
            Value::String(s) => CellValue::Text(s.clone()),
            Value::Long(v) => CellValue::Integer(*v),
            Value::Double(v) => CellValue::Number(*v),
            Value::Boolean(v) => CellValue::Bool(*v),
            Value::Timestamp(ts) => CellValue::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
            Value::Json(json) => CellValue::Text(json.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn fmt(column_type: ColumnType, value: Value) -> CellValue {
        DefaultFormatter.format_value(column_type, &value, "NULL")
    }

    #[test]
    fn test_null_uses_representation() {
        assert_eq!(fmt(ColumnType::Long, Value::Null), CellValue::Text("NULL".into()));
        assert_eq!(
            DefaultFormatter.format_value(ColumnType::String, &Value::Null, ""),
            CellValue::Text(String::new())
        );
    }

    #[test]
    fn test_scalars() {
        assert_eq!(fmt(ColumnType::String, Value::String("x".into())), CellValue::Text("x".into()));
        assert_eq!(fmt(ColumnType::Long, Value::Long(5)), CellValue::Integer(5));
        assert_eq!(fmt(ColumnType::Double, Value::Double(0.5)), CellValue::Number(0.5));
        assert_eq!(fmt(ColumnType::Boolean, Value::Boolean(false)), CellValue::Bool(false));
    }

    #[test]
    fn test_timestamp() {
        let ts = Utc.with_ymd_and_hms(2015, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            fmt(ColumnType::Timestamp, Value::Timestamp(ts)),
            CellValue::Text("2015-01-02 03:04:05 UTC".into())
        );
    }

    #[test]
    fn test_json_is_compact() {
        assert_eq!(
            fmt(ColumnType::Json, Value::Json(json!({"a": [1, 2]}))),
            CellValue::Text(r#"{"a":[1,2]}"#.into())
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text(String::new()).is_empty());
        assert!(!CellValue::Integer(0).is_empty());
    }
}
