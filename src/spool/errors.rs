//! Spool error types
//!
//! Error codes:
//! - SPOOL_RECORD_TOO_LARGE (FATAL)
//! - SPOOL_CORRUPT_FRAME (FATAL)
//! - SPOOL_TRUNCATED (FATAL)
//! - SPOOL_SEALED (ERROR)
//! - SPOOL_IO_FAILED (ERROR)

use std::fmt;
use std::io;

/// Severity levels for spool errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller may decide what to do
    Error,
    /// The run must be aborted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Spool-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolErrorCode {
    /// Serialized payload exceeds the u32 length field
    RecordTooLarge,
    /// Checksum mismatch or unparseable payload
    CorruptFrame,
    /// Fewer bytes remain than the frame header declares
    TruncatedSpool,
    /// Append attempted after draining began
    SpoolSealed,
    /// Underlying file operation failed
    Io,
}

impl SpoolErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SpoolErrorCode::RecordTooLarge => "SPOOL_RECORD_TOO_LARGE",
            SpoolErrorCode::CorruptFrame => "SPOOL_CORRUPT_FRAME",
            SpoolErrorCode::TruncatedSpool => "SPOOL_TRUNCATED",
            SpoolErrorCode::SpoolSealed => "SPOOL_SEALED",
            SpoolErrorCode::Io => "SPOOL_IO_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SpoolErrorCode::RecordTooLarge => Severity::Fatal,
            SpoolErrorCode::CorruptFrame => Severity::Fatal,
            SpoolErrorCode::TruncatedSpool => Severity::Fatal,
            SpoolErrorCode::SpoolSealed => Severity::Error,
            SpoolErrorCode::Io => Severity::Error,
        }
    }
}

impl fmt::Display for SpoolErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Spool error with context
#[derive(Debug)]
pub struct SpoolError {
    code: SpoolErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl SpoolError {
    /// Payload of `length` bytes does not fit the frame header
    pub fn record_too_large(length: u64) -> Self {
        Self {
            code: SpoolErrorCode::RecordTooLarge,
            message: format!(
                "record payload of {} bytes exceeds maximum of {} bytes",
                length,
                u32::MAX
            ),
            details: None,
            source: None,
        }
    }

    /// Create a corrupt frame error
    pub fn corrupt_frame(message: impl Into<String>) -> Self {
        Self {
            code: SpoolErrorCode::CorruptFrame,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a truncated spool error
    pub fn truncated(message: impl Into<String>) -> Self {
        Self {
            code: SpoolErrorCode::TruncatedSpool,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a sealed spool error
    pub fn sealed() -> Self {
        Self {
            code: SpoolErrorCode::SpoolSealed,
            message: "spool is sealed for writing once draining has begun".to_string(),
            details: None,
            source: None,
        }
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: SpoolErrorCode::Io,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Attach frame position context
    pub fn at_frame(mut self, index: u64, offset: u64) -> Self {
        self.details = Some(format!("frame_index: {}, byte_offset: {}", index, offset));
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SpoolErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error aborts the run
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SpoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for SpoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for spool operations
pub type SpoolResult<T> = Result<T, SpoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SpoolErrorCode::RecordTooLarge.code(), "SPOOL_RECORD_TOO_LARGE");
        assert_eq!(SpoolErrorCode::CorruptFrame.code(), "SPOOL_CORRUPT_FRAME");
        assert_eq!(SpoolErrorCode::TruncatedSpool.code(), "SPOOL_TRUNCATED");
        assert_eq!(SpoolErrorCode::SpoolSealed.code(), "SPOOL_SEALED");
        assert_eq!(SpoolErrorCode::Io.code(), "SPOOL_IO_FAILED");
    }

    #[test]
    fn test_integrity_errors_are_fatal() {
        assert!(SpoolError::record_too_large(1 << 32).is_fatal());
        assert!(SpoolError::corrupt_frame("checksum mismatch").is_fatal());
        assert!(SpoolError::truncated("short read").is_fatal());
        assert!(!SpoolError::sealed().is_fatal());
    }

    #[test]
    fn test_display_contains_context() {
        let err = SpoolError::corrupt_frame("checksum mismatch").at_frame(3, 120);
        let display = format!("{}", err);
        assert!(display.contains("FATAL"));
        assert!(display.contains("SPOOL_CORRUPT_FRAME"));
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains("frame_index: 3"));
        assert!(display.contains("byte_offset: 120"));
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;

        let err = SpoolError::io(
            "write failed",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        );
        assert!(err.source().is_some());
        assert_eq!(err.code(), SpoolErrorCode::Io);
    }
}
