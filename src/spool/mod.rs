//! Record spool subsystem
//!
//! Stages typed records on secondary storage while the destination is not
//! yet ready. Each record becomes one frame:
//!
//! ```text
//! | crc32 (u32 LE) | payload length (u32 LE) | payload |
//! ```
//!
//! # Guarantees
//!
//! - Records drain in exactly the order they were appended
//! - A frame whose checksum disagrees with its payload is never decoded
//! - A frame cut short on disk is reported, never skipped
//! - The backing file is removed on close and on drop
//!
//! Integrity failures are fatal to the run: a staged record cannot be skipped
//! without misreporting what was written.

mod checksum;
mod codec;
mod errors;
mod frame;
#[allow(clippy::module_inception)]
mod spool;

pub use checksum::{compute_checksum, verify_checksum};
pub use codec::{decode, encode, RECORD_FORMAT_VERSION};
pub use errors::{Severity, SpoolError, SpoolErrorCode, SpoolResult};
pub use frame::{check_payload_length, Frame, FRAME_HEADER_SIZE, MAX_PAYLOAD_LEN};
pub use spool::{Drain, RecordSpool};
