//! Column definitions
//!
//! Supported column types:
//! - string: UTF-8 string
//! - long: 64-bit signed integer
//! - double: 64-bit floating point
//! - boolean
//! - timestamp: UTC instant with nanosecond precision
//! - json: arbitrary JSON document
//! - null: column that only ever carries nulls

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::value::{Field, Record, Value};

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Long,
    Double,
    Boolean,
    Timestamp,
    Json,
    Null,
}

impl ColumnType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Long => "long",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
            ColumnType::Null => "null",
        }
    }

    /// Returns true if `value` may be stored in a column of this type.
    ///
    /// Null is accepted by every column type.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (ColumnType::String, Value::String(_))
                | (ColumnType::Long, Value::Long(_))
                | (ColumnType::Double, Value::Double(_))
                | (ColumnType::Boolean, Value::Boolean(_))
                | (ColumnType::Timestamp, Value::Timestamp(_))
                | (ColumnType::Json, Value::Json(_))
        )
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered column list shared by every record of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema. At least one column is required because the
    /// destination column span is derived from the column count.
    pub fn new(columns: Vec<Column>) -> SchemaResult<Self> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns (record arity)
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in schema order, used for the header row
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Zips a row of values with the column names and types.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` if the row length differs from the schema
    /// - `TypeMismatch` if a non-null value disagrees with its column type
    pub fn bind(&self, values: Vec<Value>) -> SchemaResult<Record> {
        if values.len() != self.columns.len() {
            return Err(SchemaError::ArityMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let mut fields = Vec::with_capacity(values.len());
        for (column, value) in self.columns.iter().zip(values) {
            if !column.column_type.accepts(&value) {
                return Err(SchemaError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.column_type.type_name(),
                    actual: value.kind_name(),
                });
            }
            fields.push(Field::new(column.name.clone(), column.column_type, value));
        }

        Ok(Record::new(fields))
    }
}
