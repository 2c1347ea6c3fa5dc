//! sheetspool - Spool query results and write them into a spreadsheet grid
//!
//! Records are staged in a checksummed temporary spool while the query runs,
//! then positioned (append or replace) and replayed cell by cell through a
//! `Destination`.

pub mod observability;
pub mod output;
pub mod position;
pub mod schema;
pub mod spool;

pub use output::{
    CellValue, DefaultFormatter, Destination, DestinationError, MemoryWorksheet, OutputConfig,
    OutputError, OutputResult, OutputState, OutputTask, RunReport, SpreadsheetOutput,
    ValueFormatter,
};
pub use position::{CellRef, WriteMode};
pub use schema::{Column, ColumnType, Record, Schema, Value};
pub use spool::{RecordSpool, SpoolError, SpoolErrorCode};
