//! Destination collaborator interface
//!
//! The remote grid is reached only through this trait. Implementations own
//! the session, authentication, and any batching of remote calls; `save` is
//! the point where buffered writes must be pushed.

use thiserror::Error;

use super::format::CellValue;
use crate::position::{ColumnSpan, OccupiedCells};

/// Result type for destination operations
pub type DestinationResult<T> = Result<T, DestinationError>;

/// Failures reported by a destination. Passed to the host unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DestinationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// A cell-addressed, 1-based grid
pub trait Destination {
    /// Snapshot of cells within `span`: (row, column) -> non-empty.
    fn fetch_occupied_cells(&mut self, span: ColumnSpan) -> DestinationResult<OccupiedCells>;

    /// Current last row of the grid.
    fn last_row(&mut self) -> DestinationResult<u32>;

    fn write_cell(&mut self, row: u32, column: u32, value: CellValue) -> DestinationResult<()>;

    /// Writes `values` left to right starting at (`row`, `start_column`).
    fn write_row(&mut self, row: u32, start_column: u32, values: &[CellValue]) -> DestinationResult<()> {
        for (offset, value) in values.iter().enumerate() {
            self.write_cell(row, start_column + offset as u32, value.clone())?;
        }
        Ok(())
    }

    /// Blanks rows `row_start..=row_end` across `span`.
    fn clear_range(&mut self, row_start: u32, row_end: u32, span: ColumnSpan) -> DestinationResult<()>;

    /// Flushes buffered writes.
    fn save(&mut self) -> DestinationResult<()>;
}
