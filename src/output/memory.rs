//! In-memory destination
//!
//! A complete `Destination` backed by a sparse map. Used by hosts that need
//! a dry run and by the test suite, which can also inject a failure after a
//! given number of cell writes.

use std::collections::BTreeMap;

use super::destination::{Destination, DestinationError, DestinationResult};
use super::format::CellValue;
use crate::position::{ColumnSpan, OccupiedCells};

/// Sparse in-memory grid
#[derive(Debug, Clone, Default)]
pub struct MemoryWorksheet {
    cells: BTreeMap<(u32, u32), CellValue>,
    /// Allocated row count, independent of content
    rows: u32,
    saves: usize,
    cell_writes: usize,
    clears: Vec<(u32, u32, ColumnSpan)>,
    fail_after_writes: Option<usize>,
}

impl MemoryWorksheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A grid that already has `rows` allocated rows.
    pub fn with_rows(rows: u32) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Makes every cell write after the first `writes` fail.
    pub fn fail_after_writes(&mut self, writes: usize) {
        self.fail_after_writes = Some(writes);
    }

    /// Sets a cell directly, bypassing failure injection.
    pub fn set(&mut self, row: u32, column: u32, value: CellValue) {
        self.rows = self.rows.max(row);
        self.cells.insert((row, column), value);
    }

    pub fn get(&self, row: u32, column: u32) -> Option<&CellValue> {
        self.cells.get(&(row, column))
    }

    /// Row `row` across `span`, `Empty` where unset.
    pub fn row_values(&self, row: u32, span: ColumnSpan) -> Vec<CellValue> {
        span.columns()
            .map(|column| self.get(row, column).cloned().unwrap_or(CellValue::Empty))
            .collect()
    }

    /// Number of `save` calls
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Recorded `clear_range` calls as (row_start, row_end, span)
    pub fn clears(&self) -> &[(u32, u32, ColumnSpan)] {
        &self.clears
    }

    /// Successful cell writes, header included
    pub fn cell_writes(&self) -> usize {
        self.cell_writes
    }

    /// Greatest row holding a non-empty cell, 0 if none
    pub fn last_content_row(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|((row, _), _)| *row)
            .max()
            .unwrap_or(0)
    }
}

impl Destination for MemoryWorksheet {
    fn fetch_occupied_cells(&mut self, span: ColumnSpan) -> DestinationResult<OccupiedCells> {
        Ok(self
            .cells
            .iter()
            .filter(|((_, column), _)| span.contains(*column))
            .map(|(key, value)| (*key, !value.is_empty()))
            .collect())
    }

    fn last_row(&mut self) -> DestinationResult<u32> {
        Ok(self.rows)
    }

    fn write_cell(&mut self, row: u32, column: u32, value: CellValue) -> DestinationResult<()> {
        if let Some(limit) = self.fail_after_writes {
            if self.cell_writes >= limit {
                return Err(DestinationError::Quota(format!(
                    "write limit of {} cells reached",
                    limit
                )));
            }
        }
        self.set(row, column, value);
        self.cell_writes += 1;
        Ok(())
    }

    fn clear_range(&mut self, row_start: u32, row_end: u32, span: ColumnSpan) -> DestinationResult<()> {
        for row in row_start..=row_end {
            for column in span.columns() {
                self.cells.remove(&(row, column));
            }
        }
        self.clears.push((row_start, row_end, span));
        Ok(())
    }

    fn save(&mut self) -> DestinationResult<()> {
        self.saves += 1;
        Ok(())
    }
}
