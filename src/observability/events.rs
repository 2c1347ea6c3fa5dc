//! Observable events
//!
//! Events are explicit and typed; the string form is the `event` key of the
//! log line.

use std::fmt;

/// Observable events of an output run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration validated into a task
    ConfigLoaded,

    // Spool
    /// Spool file created
    SpoolCreated,
    /// Spool file removed
    SpoolClosed,
    /// Record refused by the spool, e.g. too large for a frame
    SpoolAppendRejected,
    /// Checksum mismatch or truncation while draining (FATAL)
    SpoolCorruption,

    // Ingestion
    /// A batch was staged
    BatchStaged,
    /// A row was rejected before staging
    RecordRejected,

    // Finalize
    /// Start position computed
    PositionResolved,
    /// Replace-mode clearing begins
    ClearBegin,
    /// Replace-mode clearing complete
    ClearComplete,
    /// Header row written
    HeaderWritten,
    /// Header already present above prior records
    HeaderSkipped,
    /// Run finished successfully
    RunComplete,
    /// Run aborted (FATAL)
    RunFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::SpoolCreated => "SPOOL_CREATED",
            Event::SpoolClosed => "SPOOL_CLOSED",
            Event::SpoolAppendRejected => "SPOOL_APPEND_REJECTED",
            Event::SpoolCorruption => "SPOOL_CORRUPTION",

            Event::BatchStaged => "BATCH_STAGED",
            Event::RecordRejected => "RECORD_REJECTED",

            Event::PositionResolved => "POSITION_RESOLVED",
            Event::ClearBegin => "CLEAR_BEGIN",
            Event::ClearComplete => "CLEAR_COMPLETE",
            Event::HeaderWritten => "HEADER_WRITTEN",
            Event::HeaderSkipped => "HEADER_SKIPPED",
            Event::RunComplete => "RUN_COMPLETE",
            Event::RunFailed => "RUN_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SpoolCorruption | Event::RunFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
