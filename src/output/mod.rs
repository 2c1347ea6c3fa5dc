//! Spreadsheet output
//!
//! Stages typed records in a spool while the upstream query runs, then
//! positions them in the destination grid and replays them:
//!
//! 1. `OutputConfig::validate` yields an `OutputTask`
//! 2. `SpreadsheetOutput::add` is called once per page of rows
//! 3. `SpreadsheetOutput::finish` resolves the start row, clears (replace
//!    mode), writes the header, and replays the spool
//!
//! The destination is reached only through the `Destination` trait.

mod config;
mod destination;
mod errors;
mod format;
mod memory;
mod orchestrator;

pub use config::{OutputConfig, OutputTask};
pub use destination::{Destination, DestinationError, DestinationResult};
pub use errors::{OutputError, OutputResult};
pub use format::{CellValue, DefaultFormatter, ValueFormatter, TIMESTAMP_FORMAT};
pub use memory::MemoryWorksheet;
pub use orchestrator::{OutputState, RunReport, SpreadsheetOutput};
