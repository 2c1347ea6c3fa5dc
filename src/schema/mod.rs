//! Record schema and typed values
//!
//! A run carries exactly one `Schema`. Every record staged during the run is
//! produced by `Schema::bind`, so all records share the same arity, field
//! order and column types.

mod errors;
mod types;
mod value;

pub use errors::{SchemaError, SchemaResult};
pub use types::{Column, ColumnType, Schema};
pub use value::{Field, Record, Value};
