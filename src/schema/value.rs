//! Typed values and records

use chrono::{DateTime, Utc};

use super::types::ColumnType;

/// A single typed value. `Null` is the distinguished null marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Returns the kind name for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Long(_) => "long",
            Value::Double(_) => "double",
            Value::Boolean(_) => "boolean",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One (name, semantic type, value) triple
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub column_type: ColumnType,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, column_type: ColumnType, value: Value) -> Self {
        Self {
            name: name.into(),
            column_type,
            value,
        }
    }
}

/// An ordered sequence of fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }
}
