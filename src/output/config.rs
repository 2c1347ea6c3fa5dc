//! Output configuration
//!
//! `OutputConfig` mirrors the user-facing settings and carries their
//! defaults. `validate` turns it into an immutable `OutputTask` that every
//! component borrows for the rest of the run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::{OutputError, OutputResult};
use crate::observability::{log_event_with_fields, Event};
use crate::position::{CellRef, WriteMode};

/// Raw output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Destination spreadsheet key (required)
    pub spreadsheet_id: String,

    /// Worksheet id within the spreadsheet (default: 0)
    #[serde(default)]
    pub worksheet_gid: i64,

    /// "append" or "replace" (default: "append")
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Write a header row of column names (default: false)
    #[serde(default)]
    pub is_write_header: bool,

    /// Top-left cell of the output, A1 or R1C1 (default: "A1")
    #[serde(default = "default_start_cell")]
    pub start_cell: String,

    /// Text written for null values (default: "")
    #[serde(default)]
    pub null_representation: String,

    /// Directory for the spool file (default: system temp dir)
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,
}

fn default_mode() -> String {
    WriteMode::Append.as_str().to_string()
}

fn default_start_cell() -> String {
    "A1".to_string()
}

impl OutputConfig {
    /// Creates a config with defaults for everything but the spreadsheet id.
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet_gid: 0,
            mode: default_mode(),
            is_write_header: false,
            start_cell: default_start_cell(),
            null_representation: String::new(),
            spool_dir: None,
        }
    }

    /// Parses a JSON config document.
    pub fn from_json(json: &str) -> OutputResult<Self> {
        serde_json::from_str(json).map_err(|e| OutputError::Config(e.to_string()))
    }

    /// Validates the config into an immutable task.
    ///
    /// # Errors
    ///
    /// - `UnsupportedMode` if `mode` is neither append nor replace
    /// - `InvalidCell` if `start_cell` cannot be parsed
    /// - `Config` if `spreadsheet_id` is empty
    pub fn validate(&self) -> OutputResult<OutputTask> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(OutputError::Config("spreadsheet_id must not be empty".into()));
        }

        let mode: WriteMode = self.mode.parse()?;
        let start_cell = CellRef::parse(&self.start_cell)?;

        let task = OutputTask {
            spreadsheet_id: self.spreadsheet_id.clone(),
            worksheet_gid: self.worksheet_gid,
            mode,
            start_cell,
            write_header: self.is_write_header,
            null_representation: self.null_representation.clone(),
            spool_dir: self.spool_dir.clone(),
        };

        let gid = task.worksheet_gid.to_string();
        let start = task.start_cell.to_a1();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("mode", task.mode.as_str()),
                ("spreadsheet_id", task.spreadsheet_id.as_str()),
                ("start_cell", start.as_str()),
                ("worksheet_gid", gid.as_str()),
            ],
        );

        Ok(task)
    }
}

/// Validated, immutable run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTask {
    pub spreadsheet_id: String,
    pub worksheet_gid: i64,
    pub mode: WriteMode,
    pub start_cell: CellRef,
    pub write_header: bool,
    pub null_representation: String,
    pub spool_dir: Option<PathBuf>,
}
