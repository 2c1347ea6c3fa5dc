//! Start position resolution
//!
//! Decides where replay begins in the destination grid:
//! - append: first row after the last occupied row of the record's column
//!   span, never above the configured start cell
//! - replace: exactly the configured start cell; prior content in the span is
//!   cleared by the caller before replay
//!
//! `resolve` is a pure function of its inputs.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cell::{CellRef, ColumnSpan};
use super::errors::{PositionError, PositionResult};

/// Snapshot of destination occupancy: (row, column) -> cell is non-empty
pub type OccupiedCells = BTreeMap<(u32, u32), bool>;

/// How a run treats existing destination content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Append,
    Replace,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Append => "append",
            WriteMode::Replace => "replace",
        }
    }
}

impl FromStr for WriteMode {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(WriteMode::Append),
            "replace" => Ok(WriteMode::Replace),
            other => Err(PositionError::UnsupportedMode(other.to_string())),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative start of replay for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositioningResult {
    pub start_row: u32,
    pub start_column: u32,
    pub prior_record_exists: bool,
}

/// Inclusive row range to blank across a column span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearRange {
    pub row_start: u32,
    pub row_end: u32,
    pub span: ColumnSpan,
}

/// Greatest row holding a non-empty cell inside `span`, 0 if none.
pub fn last_occupied_row(occupied: &OccupiedCells, span: ColumnSpan) -> u32 {
    occupied
        .iter()
        .filter(|((_, column), non_empty)| **non_empty && span.contains(*column))
        .map(|((row, _), _)| *row)
        .max()
        .unwrap_or(0)
}

/// Computes the replay start position.
///
/// `field_count` is the record arity; the column span is
/// `[start_cell.column, start_cell.column + field_count)`.
///
/// # Errors
///
/// Returns `OutOfGrid` in append mode when the last occupied row of the span
/// is `u32::MAX`, leaving no row to append to.
pub fn resolve(
    occupied: &OccupiedCells,
    start_cell: CellRef,
    mode: WriteMode,
    field_count: u32,
) -> PositionResult<PositioningResult> {
    match mode {
        WriteMode::Replace => Ok(PositioningResult {
            start_row: start_cell.row,
            start_column: start_cell.column,
            prior_record_exists: false,
        }),
        WriteMode::Append => {
            let span = ColumnSpan::new(start_cell.column, field_count);
            let last_row = last_occupied_row(occupied, span);
            let next_row = last_row.checked_add(1).ok_or_else(|| {
                PositionError::OutOfGrid(format!("no row left below occupied row {}", last_row))
            })?;
            let start_row = start_cell.row.max(next_row);
            Ok(PositioningResult {
                start_row,
                start_column: start_cell.column,
                prior_record_exists: start_row > start_cell.row,
            })
        }
    }
}

/// Rows to blank before a replace-mode replay.
///
/// `last_row` is the destination's current last row. Returns `None` when the
/// destination ends above the start row, leaving nothing to clear.
pub fn clear_range(result: &PositioningResult, field_count: u32, last_row: u32) -> Option<ClearRange> {
    if last_row < result.start_row || field_count == 0 {
        return None;
    }
    Some(ClearRange {
        row_start: result.start_row,
        row_end: last_row,
        span: ColumnSpan::new(result.start_column, field_count),
    })
}
