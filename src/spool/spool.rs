//! Temporary-file-backed record spool
//!
//! Lifecycle:
//! 1. `create` / `create_in` opens an exclusively owned temporary file
//! 2. `append` writes frames sequentially
//! 3. `drain` rewinds once and yields records in append order
//! 4. `close` (or drop) removes the file
//!
//! A spool supports exactly one write pass followed by one read pass. After
//! `drain` has been called, further appends are rejected, and a second `drain`
//! continues from where the first stopped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use super::codec;
use super::errors::{SpoolError, SpoolErrorCode, SpoolResult};
use super::frame::Frame;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Record;

const SPOOL_FILE_PREFIX: &str = "sheetspool_";

enum Phase {
    Writing(BufWriter<File>),
    Reading(BufReader<File>),
    Closed,
}

/// Append-then-drain staging area for records
pub struct RecordSpool {
    /// Owns the filesystem entry; removed on close or drop
    temp: Option<NamedTempFile>,
    phase: Phase,
    frames_written: u64,
    bytes_written: u64,
    /// Read position, counted from the start of the file
    read_offset: u64,
    frames_read: u64,
    failed: bool,
}

impl RecordSpool {
    /// Creates a spool in the system temporary directory.
    pub fn create() -> SpoolResult<Self> {
        Self::create_in(&std::env::temp_dir())
    }

    /// Creates a spool inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns `SPOOL_IO_FAILED` if the temporary file cannot be created.
    pub fn create_in(dir: &Path) -> SpoolResult<Self> {
        let temp = Builder::new()
            .prefix(SPOOL_FILE_PREFIX)
            .suffix(".spool")
            .tempfile_in(dir)
            .map_err(|e| {
                SpoolError::io(
                    format!("failed to create spool file in {}", dir.display()),
                    e,
                )
            })?;

        let handle = temp
            .as_file()
            .try_clone()
            .map_err(|e| SpoolError::io("failed to open spool file handle", e))?;

        let path = temp.path().display().to_string();
        log_event_with_fields(Event::SpoolCreated, &[("path", path.as_str())]);

        Ok(Self {
            temp: Some(temp),
            phase: Phase::Writing(BufWriter::new(handle)),
            frames_written: 0,
            bytes_written: 0,
            read_offset: 0,
            frames_read: 0,
            failed: false,
        })
    }

    /// Path of the backing file, `None` once closed.
    pub fn path(&self) -> Option<&Path> {
        self.temp.as_ref().map(|t| t.path())
    }

    /// Number of records appended so far
    pub fn len(&self) -> u64 {
        self.frames_written
    }

    pub fn is_empty(&self) -> bool {
        self.frames_written == 0
    }

    /// Bytes written to the backing file so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Encodes `record` and appends its frame.
    ///
    /// # Errors
    ///
    /// - `SPOOL_RECORD_TOO_LARGE` if the encoded record does not fit a frame
    /// - `SPOOL_SEALED` if draining has begun, the spool is closed, or an
    ///   earlier append failed
    /// - `SPOOL_IO_FAILED` if the write fails; the spool is sealed afterwards
    pub fn append(&mut self, record: &Record) -> SpoolResult<()> {
        let writer = match self.phase {
            Phase::Writing(ref mut w) => w,
            _ => return Err(SpoolError::sealed()),
        };

        let frame = codec::encode(record).map_err(|e| {
            let error = e.to_string();
            log_event_with_fields(Event::SpoolAppendRejected, &[("error", error.as_str())]);
            e
        })?;
        if let Err(e) = frame.write_to(writer) {
            // A partial frame may be on disk; nothing may follow it.
            self.phase = Phase::Closed;
            return Err(SpoolError::io(
                format!("failed to append frame {}", self.frames_written),
                e,
            ));
        }

        self.frames_written += 1;
        self.bytes_written += frame.encoded_len();
        Ok(())
    }

    /// Pushes buffered frames to the backing file.
    ///
    /// # Errors
    ///
    /// Returns `SPOOL_IO_FAILED` if the flush fails, or `SPOOL_SEALED` once
    /// draining has begun.
    pub fn flush(&mut self) -> SpoolResult<()> {
        match self.phase {
            Phase::Writing(ref mut w) => w
                .flush()
                .map_err(|e| SpoolError::io("failed to flush spool", e)),
            _ => Err(SpoolError::sealed()),
        }
    }

    /// Seals the spool and returns an iterator over the staged records.
    ///
    /// The first call flushes pending writes and rewinds to the start of the
    /// file. Later calls resume from the current read position, which is end
    /// of file once a previous drain was exhausted.
    ///
    /// # Errors
    ///
    /// Returns `SPOOL_IO_FAILED` if flushing or rewinding fails, or
    /// `SPOOL_SEALED` if the spool is closed.
    pub fn drain(&mut self) -> SpoolResult<Drain<'_>> {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Writing(writer) => {
                let mut file = writer
                    .into_inner()
                    .map_err(|e| SpoolError::io("failed to flush spool", e.into_error()))?;
                file.seek(SeekFrom::Start(0))
                    .map_err(|e| SpoolError::io("failed to rewind spool", e))?;
                self.phase = Phase::Reading(BufReader::new(file));
            }
            Phase::Reading(reader) => self.phase = Phase::Reading(reader),
            Phase::Closed => return Err(SpoolError::sealed()),
        }

        Ok(Drain { spool: self })
    }

    /// Releases the file handle and removes the backing file.
    ///
    /// # Errors
    ///
    /// Returns `SPOOL_IO_FAILED` if the file cannot be removed.
    pub fn close(mut self) -> SpoolResult<()> {
        self.release()
    }

    fn release(&mut self) -> SpoolResult<()> {
        self.phase = Phase::Closed;

        match self.temp.take() {
            Some(temp) => {
                let path = temp.path().display().to_string();
                temp.close()
                    .map_err(|e| SpoolError::io(format!("failed to remove spool {}", path), e))?;
                let frames = self.frames_written.to_string();
                log_event_with_fields(
                    Event::SpoolClosed,
                    &[("frames", frames.as_str()), ("path", path.as_str())],
                );
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn read_next(&mut self) -> SpoolResult<Option<Record>> {
        let reader = match self.phase {
            Phase::Reading(ref mut r) => r,
            _ => return Ok(None),
        };

        let remaining = self.bytes_written.saturating_sub(self.read_offset);
        let frame = match Frame::read_from(reader, remaining) {
            Ok(Some(frame)) => frame,
            Ok(None) if remaining == 0 => return Ok(None),
            Ok(None) => {
                let missing = SpoolError::truncated(format!(
                    "spool ended {} bytes early after {} of {} frames",
                    remaining, self.frames_read, self.frames_written
                ));
                return Err(missing.at_frame(self.frames_read, self.read_offset));
            }
            Err(e) => return Err(e.at_frame(self.frames_read, self.read_offset)),
        };

        let record =
            codec::decode(&frame).map_err(|e| e.at_frame(self.frames_read, self.read_offset))?;

        self.read_offset += frame.encoded_len();
        self.frames_read += 1;
        Ok(Some(record))
    }
}

impl Drop for RecordSpool {
    fn drop(&mut self) {
        // NamedTempFile removes itself on drop as well; this only adds the log line.
        let _ = self.release();
    }
}

/// Lazy iterator over staged records, produced by [`RecordSpool::drain`].
///
/// Yields at most one error; after an error the iterator is exhausted.
pub struct Drain<'a> {
    spool: &'a mut RecordSpool,
}

impl Iterator for Drain<'_> {
    type Item = SpoolResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.spool.failed {
            return None;
        }
        match self.spool.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.spool.failed = true;
                if matches!(
                    e.code(),
                    SpoolErrorCode::CorruptFrame | SpoolErrorCode::TruncatedSpool
                ) {
                    let error = e.to_string();
                    log_event_with_fields(Event::SpoolCorruption, &[("error", error.as_str())]);
                }
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, Field, Value};
    use tempfile::TempDir;

    fn record(i: i64) -> Record {
        Record::new(vec![
            Field::new("id", ColumnType::Long, Value::Long(i)),
            Field::new("label", ColumnType::String, Value::String(format!("row{}", i))),
        ])
    }

    #[test]
    fn test_drain_preserves_append_order() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        for i in 0..100 {
            spool.append(&record(i)).unwrap();
        }
        assert_eq!(spool.len(), 100);

        let drained: Vec<Record> = spool.drain().unwrap().collect::<SpoolResult<_>>().unwrap();
        let expected: Vec<Record> = (0..100).map(record).collect();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_empty_spool_drains_nothing() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        assert!(spool.is_empty());
        assert_eq!(spool.drain().unwrap().count(), 0);
    }

    #[test]
    fn test_second_drain_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        spool.append(&record(1)).unwrap();
        spool.append(&record(2)).unwrap();

        assert_eq!(spool.drain().unwrap().count(), 2);
        assert_eq!(spool.drain().unwrap().count(), 0);
    }

    #[test]
    fn test_append_after_drain_is_sealed() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        spool.append(&record(1)).unwrap();
        let _ = spool.drain().unwrap();

        let err = spool.append(&record(2)).unwrap_err();
        assert_eq!(err.code(), SpoolErrorCode::SpoolSealed);
    }

    #[test]
    fn test_bytes_written_tracks_frames() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        spool.append(&record(7)).unwrap();

        let expected = codec::encode(&record(7)).unwrap().encoded_len();
        assert_eq!(spool.bytes_written(), expected);
    }

    #[test]
    fn test_close_removes_file() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        spool.append(&record(1)).unwrap();
        let path = spool.path().unwrap().to_path_buf();
        assert!(path.exists());

        spool.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = {
            let mut spool = RecordSpool::create_in(dir.path()).unwrap();
            spool.append(&record(1)).unwrap();
            spool.path().unwrap().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_file_name_has_prefix() {
        let dir = TempDir::new().unwrap();
        let spool = RecordSpool::create_in(dir.path()).unwrap();
        let name = spool.path().unwrap().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(SPOOL_FILE_PREFIX));
    }

    #[test]
    fn test_failed_append_seals_spool() {
        let dir = TempDir::new().unwrap();
        let mut spool = RecordSpool::create_in(dir.path()).unwrap();
        spool.append(&record(1)).unwrap();

        // Unbuffered read-only handle: the next frame write fails immediately.
        let read_only = File::open(spool.path().unwrap()).unwrap();
        spool.phase = Phase::Writing(BufWriter::with_capacity(0, read_only));

        let err = spool.append(&record(2)).unwrap_err();
        assert_eq!(err.code(), SpoolErrorCode::Io);

        let err = spool.append(&record(3)).unwrap_err();
        assert_eq!(err.code(), SpoolErrorCode::SpoolSealed);
        assert_eq!(spool.len(), 1);
        assert_eq!(spool.drain().err().map(|e| e.code()), Some(SpoolErrorCode::SpoolSealed));
    }
}
