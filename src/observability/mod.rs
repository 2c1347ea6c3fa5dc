//! Observability subsystem
//!
//! Structured JSON logging for output runs:
//! - `Logger` writes one JSON object per line
//! - `Event` names every lifecycle step
//! - `ObservationScope` brackets a phase with BEGIN/COMPLETE/FAILED lines
//!
//! Observability is read-only: it never changes the outcome of a run.
//!
//! # Usage
//!
//! ```ignore
//! use sheetspool::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::PositionResolved, &[("start_row", "6")]);
//!
//! let scope = ObservationScope::with_fields("REPLAY", &[("run_id", run_id)]);
//! // ... write records ...
//! scope.complete_with_fields(&[("records", "42")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_events() {
        assert_eq!(severity_for(Event::RunFailed), Severity::Fatal);
        assert_eq!(severity_for(Event::SpoolCreated), Severity::Info);
    }

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::RunComplete);
        log_event_with_fields(Event::ConfigLoaded, &[("mode", "append")]);
    }
}
