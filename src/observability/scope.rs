//! Begin/complete logging around a phase of work
//!
//! - `{name}_BEGIN` on creation
//! - `{name}_COMPLETE` on `complete_with_fields`
//! - `{name}_FAILED` on `fail`
//! - `{name}_INCOMPLETE` if dropped without either

use std::time::Instant;

use super::logger::Logger;

/// A scope that logs the start and the outcome of a phase.
///
/// Fields given at creation are repeated on every outcome line, so a
/// `run_id` only needs to be attached once.
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: bool,
    fields: Vec<(&'a str, String)>,
    timer: Timer,
}

impl<'a> ObservationScope<'a> {
    /// Opens a scope and logs `{name}_BEGIN`.
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);

        Self {
            name,
            completed: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            timer: Timer::new(),
        }
    }

    /// Logs `{name}_COMPLETE` with the scope fields, `elapsed_ms`, and
    /// `extra_fields`.
    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.completed = true;
        let elapsed = self.timer.elapsed_ms();

        let mut all_fields = self.field_refs();
        all_fields.push(("elapsed_ms", elapsed.as_str()));
        all_fields.extend(extra_fields.iter().copied());

        Logger::info(&format!("{}_COMPLETE", self.name), &all_fields);
    }

    /// Logs `{name}_FAILED` at ERROR level.
    pub fn fail(mut self, reason: &str) {
        self.completed = true;
        let mut all_fields = self.field_refs();
        all_fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &all_fields);
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed {
            let mut all_fields = self.field_refs();
            all_fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &all_fields);
        }
    }
}

/// Wall-clock duration timer for log fields
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds as a log field value
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
