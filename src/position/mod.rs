//! Destination positioning
//!
//! Resolves where in the destination grid a run starts writing and tracks
//! the write cursor during replay. Nothing here performs I/O; the occupancy
//! snapshot is supplied by the destination.

mod cell;
mod cursor;
mod errors;
mod resolver;

pub use cell::{CellRef, ColumnSpan};
pub use cursor::Cursor;
pub use errors::{PositionError, PositionResult};
pub use resolver::{
    clear_range, last_occupied_row, resolve, ClearRange, OccupiedCells, PositioningResult,
    WriteMode,
};
