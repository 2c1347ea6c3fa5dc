//! Schema binding errors

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while binding a row of values to a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Record arity mismatch: schema has {expected} columns, row has {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Column '{column}' expects {expected} but got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Schema must contain at least one column")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_mismatch_display() {
        let err = SchemaError::ArityMismatch { expected: 3, actual: 2 };
        let display = err.to_string();
        assert!(display.contains("3 columns"));
        assert!(display.contains("row has 2"));
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = SchemaError::TypeMismatch {
            column: "age".into(),
            expected: "long",
            actual: "string",
        };
        assert_eq!(err.to_string(), "Column 'age' expects long but got string");
    }
}
