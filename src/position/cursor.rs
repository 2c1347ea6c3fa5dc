//! Destination write cursor

use super::cell::CellRef;
use super::errors::{PositionError, PositionResult};

/// Current write position during replay.
///
/// Advances one column per field; `finish_record` returns to the base column
/// and moves down exactly one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    row: u32,
    column: u32,
    base_column: u32,
}

impl Cursor {
    pub fn new(row: u32, base_column: u32) -> Self {
        Self {
            row,
            column: base_column,
            base_column,
        }
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn base_column(&self) -> u32 {
        self.base_column
    }

    pub fn position(&self) -> CellRef {
        CellRef::new(self.row, self.column)
    }

    /// Moves one column to the right.
    ///
    /// # Errors
    ///
    /// Returns `OutOfGrid` past column `u32::MAX`; the cursor is unchanged.
    pub fn advance_column(&mut self) -> PositionResult<()> {
        self.column = self.column.checked_add(1).ok_or_else(|| {
            PositionError::OutOfGrid(format!("column after {} in row {}", self.column, self.row))
        })?;
        Ok(())
    }

    /// Completes a record: column back to base, row + 1.
    ///
    /// # Errors
    ///
    /// Returns `OutOfGrid` past row `u32::MAX`; the cursor is unchanged.
    pub fn finish_record(&mut self) -> PositionResult<()> {
        let row = self
            .row
            .checked_add(1)
            .ok_or_else(|| PositionError::OutOfGrid(format!("row after {}", self.row)))?;
        self.row = row;
        self.column = self.base_column;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_at_base_column() {
        let cursor = Cursor::new(4, 3);
        assert_eq!(cursor.position(), CellRef::new(4, 3));
        assert_eq!(cursor.base_column(), 3);
    }

    #[test]
    fn test_record_walk() {
        let mut cursor = Cursor::new(2, 2);
        for _ in 0..3 {
            cursor.advance_column().unwrap();
        }
        assert_eq!(cursor.position(), CellRef::new(2, 5));

        cursor.finish_record().unwrap();
        assert_eq!(cursor.position(), CellRef::new(3, 2));

        cursor.advance_column().unwrap();
        cursor.finish_record().unwrap();
        assert_eq!(cursor.position(), CellRef::new(4, 2));
    }

    #[test]
    fn test_last_column_does_not_wrap() {
        let mut cursor = Cursor::new(1, u32::MAX);
        let err = cursor.advance_column().unwrap_err();
        assert!(matches!(err, PositionError::OutOfGrid(_)));
        assert_eq!(cursor.position(), CellRef::new(1, u32::MAX));
    }

    #[test]
    fn test_last_row_does_not_wrap() {
        let mut cursor = Cursor::new(u32::MAX, 2);
        cursor.advance_column().unwrap();
        let err = cursor.finish_record().unwrap_err();
        assert!(matches!(err, PositionError::OutOfGrid(_)));
        assert_eq!(cursor.position(), CellRef::new(u32::MAX, 3));
    }
}
