//! Write orchestrator
//!
//! Drives one output run through its states:
//!
//! ```text
//! Ingesting -> Resolved -> (Clearing) -> (HeaderWritten) -> Replaying -> Done
//!      \___________\____________\______________\_______________\-> Failed
//! ```
//!
//! - Ingesting: rows are bound to the schema and appended to the spool; the
//!   destination is not touched
//! - Resolved: one occupancy snapshot, one call to `resolve`
//! - Clearing: replace mode only; the last row is read again right before
//!   the clear is issued
//! - HeaderWritten: only when configured and no prior records exist
//! - Replaying: the spool is drained once, one record at a time
//!
//! Any error moves the run to Failed and removes the spool file. Nothing is
//! retried here.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use super::config::OutputTask;
use super::destination::Destination;
use super::errors::{OutputError, OutputResult};
use super::format::{CellValue, ValueFormatter};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::position::{
    clear_range, resolve, ClearRange, ColumnSpan, Cursor, PositionError, PositioningResult,
    WriteMode,
};
use crate::schema::{Schema, Value};
use crate::spool::RecordSpool;

/// Lifecycle state of an output run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputState {
    Ingesting,
    Resolved,
    Clearing,
    HeaderWritten,
    Replaying,
    Done,
    Failed,
}

impl OutputState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputState::Ingesting => "INGESTING",
            OutputState::Resolved => "RESOLVED",
            OutputState::Clearing => "CLEARING",
            OutputState::HeaderWritten => "HEADER_WRITTEN",
            OutputState::Replaying => "REPLAYING",
            OutputState::Done => "DONE",
            OutputState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputState::Done | OutputState::Failed)
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a finished run, returned to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: WriteMode,
    pub position: PositioningResult,
    /// First row that received record data
    pub data_start_row: u32,
    pub header_written: bool,
    pub cleared: Option<ClearRange>,
    pub records_written: u64,
}

/// One output run: stage rows, then position and replay them.
pub struct SpreadsheetOutput<'t> {
    task: &'t OutputTask,
    schema: Schema,
    span: ColumnSpan,
    spool: Option<RecordSpool>,
    state: OutputState,
    run_id: Uuid,
}

impl<'t> SpreadsheetOutput<'t> {
    /// Starts a run in the Ingesting state with a fresh spool.
    ///
    /// # Errors
    ///
    /// - `OutOfGrid` if the schema's columns do not fit right of the start cell
    /// - a spool error if the backing file cannot be created
    pub fn new(task: &'t OutputTask, schema: Schema) -> OutputResult<Self> {
        let field_count = u32::try_from(schema.len())
            .map_err(|_| OutputError::Config("schema has too many columns".into()))?;
        let span = ColumnSpan::try_new(task.start_cell.column, field_count)?;

        let spool = match task.spool_dir {
            Some(ref dir) => RecordSpool::create_in(dir)?,
            None => RecordSpool::create()?,
        };

        Ok(Self {
            task,
            schema,
            span,
            spool: Some(spool),
            state: OutputState::Ingesting,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn state(&self) -> OutputState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Records staged so far
    pub fn staged(&self) -> u64 {
        self.spool.as_ref().map_or(0, |s| s.len())
    }

    /// Path of the spool file while it exists
    pub fn spool_path(&self) -> Option<&Path> {
        self.spool.as_ref().and_then(|s| s.path())
    }

    /// Stages a page of rows.
    ///
    /// Each row is bound to the schema and appended to the spool. No
    /// destination I/O happens here.
    ///
    /// # Errors
    ///
    /// - `InvalidState` outside the Ingesting state
    /// - `Schema` for a row that does not match the schema
    /// - `Spool` (`SPOOL_RECORD_TOO_LARGE`, I/O) from the append
    ///
    /// Every error except `InvalidState` fails the run.
    pub fn add<I>(&mut self, page: I) -> OutputResult<()>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        self.expect_state(OutputState::Ingesting, "add")?;

        let mut staged = 0u64;
        for row in page {
            let record = match self.schema.bind(row) {
                Ok(record) => record,
                Err(e) => {
                    let reason = e.to_string();
                    log_event_with_fields(Event::RecordRejected, &[("reason", reason.as_str())]);
                    return Err(self.fail(e.into()));
                }
            };

            let appended = match self.spool.as_mut() {
                Some(spool) => spool.append(&record).map_err(OutputError::from),
                None => Err(OutputError::InvalidState {
                    operation: "add",
                    state: self.state,
                }),
            };
            if let Err(e) = appended {
                return Err(self.fail(e));
            }
            staged += 1;
        }

        // Each page reaches the file before control returns to the host.
        let flushed = match self.spool.as_mut() {
            Some(spool) => spool.flush().map_err(OutputError::from),
            None => Ok(()),
        };
        if let Err(e) = flushed {
            return Err(self.fail(e));
        }

        let run_id = self.run_id.to_string();
        let records = staged.to_string();
        let total = self.staged().to_string();
        log_event_with_fields(
            Event::BatchStaged,
            &[
                ("records", records.as_str()),
                ("run_id", run_id.as_str()),
                ("total", total.as_str()),
            ],
        );
        Ok(())
    }

    /// Positions, optionally clears and writes the header, then replays
    /// every staged record into `destination`.
    ///
    /// On success the spool is closed and the run is Done. On failure the run
    /// is Failed, the spool file is already removed, and the error is
    /// returned unchanged.
    pub fn finish<D, F>(&mut self, destination: &mut D, formatter: &F) -> OutputResult<RunReport>
    where
        D: Destination + ?Sized,
        F: ValueFormatter + ?Sized,
    {
        self.expect_state(OutputState::Ingesting, "finish")?;

        match self.run_finalize(destination, formatter) {
            Ok(report) => {
                if let Some(spool) = self.spool.take() {
                    if let Err(e) = spool.close() {
                        return Err(self.fail(e.into()));
                    }
                }
                self.state = OutputState::Done;

                let run_id = self.run_id.to_string();
                let records = report.records_written.to_string();
                log_event_with_fields(
                    Event::RunComplete,
                    &[("records", records.as_str()), ("run_id", run_id.as_str())],
                );
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Ends the run, removing the spool file if it still exists.
    pub fn close(mut self) -> OutputResult<()> {
        match self.spool.take() {
            Some(spool) => Ok(spool.close()?),
            None => Ok(()),
        }
    }

    fn run_finalize<D, F>(&mut self, destination: &mut D, formatter: &F) -> OutputResult<RunReport>
    where
        D: Destination + ?Sized,
        F: ValueFormatter + ?Sized,
    {
        let task = self.task;
        let run_id = self.run_id.to_string();
        let span = self.span;
        let field_count = span.width;

        let occupied = destination.fetch_occupied_cells(span)?;
        let position = resolve(&occupied, task.start_cell, task.mode, field_count)?;
        self.state = OutputState::Resolved;
        log_position(&run_id, task.mode, &position);

        let mut cleared = None;
        if task.mode == WriteMode::Replace {
            self.state = OutputState::Clearing;
            // Re-read so rows added since the snapshot are cleared too.
            let last_row = destination.last_row()?;
            if let Some(range) = clear_range(&position, field_count, last_row) {
                let rows = format!("{}..={}", range.row_start, range.row_end);
                log_event_with_fields(
                    Event::ClearBegin,
                    &[("rows", rows.as_str()), ("run_id", run_id.as_str())],
                );
                destination.clear_range(range.row_start, range.row_end, range.span)?;
                log_event_with_fields(Event::ClearComplete, &[("run_id", run_id.as_str())]);
                cleared = Some(range);
            }
        }

        let mut data_start_row = position.start_row;
        let mut header_written = false;
        if task.write_header {
            if position.prior_record_exists {
                log_event_with_fields(Event::HeaderSkipped, &[("run_id", run_id.as_str())]);
            } else {
                let header: Vec<CellValue> = self
                    .schema
                    .names()
                    .into_iter()
                    .map(|name| CellValue::Text(name.to_string()))
                    .collect();
                data_start_row = position.start_row.checked_add(1).ok_or_else(|| {
                    PositionError::OutOfGrid(format!(
                        "no data row below header row {}",
                        position.start_row
                    ))
                })?;
                destination.write_row(position.start_row, position.start_column, &header)?;
                header_written = true;
                self.state = OutputState::HeaderWritten;

                let row = position.start_row.to_string();
                log_event_with_fields(
                    Event::HeaderWritten,
                    &[("row", row.as_str()), ("run_id", run_id.as_str())],
                );
            }
        }

        destination.save()?;

        self.state = OutputState::Replaying;
        let scope = ObservationScope::with_fields("REPLAY", &[("run_id", run_id.as_str())]);
        let mut cursor = Cursor::new(data_start_row, position.start_column);

        let replayed = match self.spool.as_mut() {
            Some(spool) => replay(
                spool,
                &mut cursor,
                destination,
                formatter,
                &task.null_representation,
            ),
            None => Err(OutputError::InvalidState {
                operation: "finish",
                state: self.state,
            }),
        };

        let records_written = match replayed {
            Ok(count) => count,
            Err(e) => {
                scope.fail(&e.to_string());
                return Err(e);
            }
        };

        let records = records_written.to_string();
        let last_row = cursor.row().to_string();
        scope.complete_with_fields(&[("last_row", last_row.as_str()), ("records", records.as_str())]);

        Ok(RunReport {
            run_id: self.run_id,
            mode: task.mode,
            position,
            data_start_row,
            header_written,
            cleared,
            records_written,
        })
    }

    fn expect_state(&self, expected: OutputState, operation: &'static str) -> OutputResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(OutputError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Moves to Failed, drops the spool (removing its file), logs, and hands
    /// the error back.
    fn fail(&mut self, error: OutputError) -> OutputError {
        let from = self.state;
        self.state = OutputState::Failed;
        drop(self.spool.take());

        let run_id = self.run_id.to_string();
        let reason = error.to_string();
        log_event_with_fields(
            Event::RunFailed,
            &[
                ("reason", reason.as_str()),
                ("run_id", run_id.as_str()),
                ("state", from.as_str()),
            ],
        );
        error
    }
}

/// Drains the spool into the destination; returns the record count.
fn replay<D, F>(
    spool: &mut RecordSpool,
    cursor: &mut Cursor,
    destination: &mut D,
    formatter: &F,
    null_representation: &str,
) -> OutputResult<u64>
where
    D: Destination + ?Sized,
    F: ValueFormatter + ?Sized,
{
    let mut written = 0u64;
    let mut records = spool.drain()?.peekable();
    while let Some(record) = records.next() {
        let record = record?;
        for field in record.fields() {
            let value = formatter.format_value(field.column_type, &field.value, null_representation);
            destination.write_cell(cursor.row(), cursor.column(), value)?;
            cursor.advance_column()?;
        }
        written += 1;
        // The cursor only moves down when another record needs the row.
        if records.peek().is_some() {
            cursor.finish_record()?;
        }
    }
    destination.save()?;
    Ok(written)
}

fn log_position(run_id: &str, mode: WriteMode, position: &PositioningResult) {
    let start_row = position.start_row.to_string();
    let start_column = position.start_column.to_string();
    let prior = position.prior_record_exists.to_string();
    log_event_with_fields(
        Event::PositionResolved,
        &[
            ("mode", mode.as_str()),
            ("prior_record_exists", prior.as_str()),
            ("run_id", run_id),
            ("start_column", start_column.as_str()),
            ("start_row", start_row.as_str()),
        ],
    );
}
