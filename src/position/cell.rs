//! Cell references and column spans
//!
//! Rows and columns are 1-based, matching spreadsheet conventions. Two
//! notations are accepted:
//! - A1: column letters followed by the row number (`"B3"`, `"AA10"`)
//! - R1C1: `"R3C2"`

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::errors::{PositionError, PositionResult};

fn a1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z]+)([0-9]+)$").expect("valid A1 regex"))
}

fn r1c1_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[Rr]([0-9]+)[Cc]([0-9]+)$").expect("valid R1C1 regex"))
}

/// A 1-based (row, column) grid address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellRef {
    pub row: u32,
    pub column: u32,
}

impl CellRef {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Parses an A1 or R1C1 cell name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCell` for malformed names, zero indices, or indices
    /// that overflow `u32`.
    pub fn parse(name: &str) -> PositionResult<Self> {
        let trimmed = name.trim();
        let invalid = || PositionError::InvalidCell(name.to_string());

        let (row, column) = if let Some(caps) = a1_pattern().captures(trimmed) {
            let column = column_from_letters(&caps[1]).ok_or_else(invalid)?;
            let row = caps[2].parse::<u32>().map_err(|_| invalid())?;
            (row, column)
        } else if let Some(caps) = r1c1_pattern().captures(trimmed) {
            let row = caps[1].parse::<u32>().map_err(|_| invalid())?;
            let column = caps[2].parse::<u32>().map_err(|_| invalid())?;
            (row, column)
        } else {
            return Err(invalid());
        };

        if row == 0 || column == 0 {
            return Err(invalid());
        }
        Ok(Self { row, column })
    }

    /// Formats the reference in A1 notation.
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_to_letters(self.column), self.row)
    }
}

impl FromStr for CellRef {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// Bijective base-26: A=1 .. Z=26, AA=27.
fn column_from_letters(letters: &str) -> Option<u32> {
    letters.bytes().try_fold(0u32, |acc, b| {
        let digit = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

fn column_to_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        letters.push(b'A' + rem);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Half-open column range `[start, start + width)` covered by one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnSpan {
    pub start: u32,
    pub width: u32,
}

impl ColumnSpan {
    pub fn new(start: u32, width: u32) -> Self {
        Self { start, width }
    }

    /// Span whose exclusive end still fits in a `u32`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfGrid` if `start + width` overflows.
    pub fn try_new(start: u32, width: u32) -> PositionResult<Self> {
        match start.checked_add(width) {
            Some(_) => Ok(Self { start, width }),
            None => Err(PositionError::OutOfGrid(format!(
                "{} columns starting at column {}",
                width, start
            ))),
        }
    }

    /// Exclusive end column
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.width)
    }

    pub fn contains(&self, column: u32) -> bool {
        column >= self.start && column < self.end()
    }

    pub fn columns(&self) -> std::ops::Range<u32> {
        self.start..self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_a1() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(1, 1));
        assert_eq!(CellRef::parse("C12").unwrap(), CellRef::new(12, 3));
        assert_eq!(CellRef::parse("Z3").unwrap(), CellRef::new(3, 26));
        assert_eq!(CellRef::parse("AA3").unwrap(), CellRef::new(3, 27));
        assert_eq!(CellRef::parse("AZ1").unwrap(), CellRef::new(1, 52));
        assert_eq!(CellRef::parse("b2").unwrap(), CellRef::new(2, 2));
    }

    #[test]
    fn test_parse_r1c1() {
        assert_eq!(CellRef::parse("R3C2").unwrap(), CellRef::new(3, 2));
        assert_eq!(CellRef::parse("r10c1").unwrap(), CellRef::new(10, 1));
        // Without a C part this is plain A1: column R, row 1
        assert_eq!(CellRef::parse("R1").unwrap(), CellRef::new(1, 18));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for name in ["", "1A", "A", "A0", "R0C1", "R1C0", "A-1", "A1B", "RC"] {
            assert_eq!(
                CellRef::parse(name),
                Err(PositionError::InvalidCell(name.to_string())),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(CellRef::parse("A99999999999").is_err());
        assert!(CellRef::parse("ZZZZZZZZZZ1").is_err());
    }

    #[test]
    fn test_to_a1() {
        assert_eq!(CellRef::new(1, 1).to_a1(), "A1");
        assert_eq!(CellRef::new(7, 26).to_a1(), "Z7");
        assert_eq!(CellRef::new(7, 27).to_a1(), "AA7");
        assert_eq!(CellRef::new(2, 702).to_a1(), "ZZ2");
        assert_eq!(CellRef::new(2, 703).to_a1(), "AAA2");
    }

    #[test]
    fn test_span_is_half_open() {
        let span = ColumnSpan::new(2, 3);
        assert!(!span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert_eq!(span.columns().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_span_end_must_fit() {
        assert_eq!(ColumnSpan::try_new(u32::MAX - 3, 3).unwrap().end(), u32::MAX);
        let err = ColumnSpan::try_new(u32::MAX, 2).unwrap_err();
        assert!(matches!(err, PositionError::OutOfGrid(_)));
    }
}
