//! Output run errors

use thiserror::Error;

use super::destination::DestinationError;
use super::orchestrator::OutputState;
use crate::position::PositionError;
use crate::schema::SchemaError;
use crate::spool::{SpoolError, SpoolErrorCode};

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything that can abort an output run.
///
/// Lower-layer errors are wrapped transparently so their codes and messages
/// reach the host unchanged.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Spool(#[from] SpoolError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Destination(#[from] DestinationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{operation} is not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: OutputState,
    },
}

impl OutputError {
    /// Returns the spool error code, if this is a spool failure
    pub fn spool_code(&self) -> Option<SpoolErrorCode> {
        match self {
            OutputError::Spool(e) => Some(e.code()),
            _ => None,
        }
    }

    /// True for failures raised by the destination collaborator
    pub fn is_destination(&self) -> bool {
        matches!(self, OutputError::Destination(_))
    }
}
