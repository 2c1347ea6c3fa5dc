//! Positioning errors

use thiserror::Error;

/// Result type for positioning operations
pub type PositionResult<T> = Result<T, PositionError>;

/// Errors raised while validating or advancing a position.
///
/// `UnsupportedMode` and `InvalidCell` are reported before any I/O.
/// `OutOfGrid` is raised when a row or column would pass `u32::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("unsupported mode: {0:?} (expected \"append\" or \"replace\")")]
    UnsupportedMode(String),

    #[error("invalid cell reference: {0:?}")]
    InvalidCell(String),

    #[error("position out of grid: {0}")]
    OutOfGrid(String),
}
