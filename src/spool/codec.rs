//! Record payload encoding
//!
//! Payload format (all integers little-endian):
//! - format version (u8)
//! - field count (u32)
//! - per field:
//!   - name length (u32) + UTF-8 name
//!   - column type tag (u8)
//!   - value tag (u8) + value body
//!
//! Value bodies:
//! - null: none
//! - string: length (u32) + UTF-8 bytes
//! - long: i64
//! - double: f64 bit pattern
//! - boolean: u8 (0 or 1)
//! - timestamp: seconds since epoch (i64) + subsecond nanos (u32)
//! - json: length (u32) + JSON text
//!
//! The payload is self-delimiting: decoding must consume it exactly.

use std::io::{Cursor, Read};

use chrono::DateTime;

use super::errors::{SpoolError, SpoolResult};
use super::frame::{check_payload_length, Frame};
use crate::schema::{ColumnType, Field, Record, Value};

/// Current payload format version
pub const RECORD_FORMAT_VERSION: u8 = 1;

const VALUE_NULL: u8 = 0;
const VALUE_STRING: u8 = 1;
const VALUE_LONG: u8 = 2;
const VALUE_DOUBLE: u8 = 3;
const VALUE_BOOLEAN: u8 = 4;
const VALUE_TIMESTAMP: u8 = 5;
const VALUE_JSON: u8 = 6;

/// Encodes a record into a sealed frame.
///
/// # Errors
///
/// Returns `SPOOL_RECORD_TOO_LARGE` if the payload, or any length-prefixed
/// item inside it, exceeds `2^32 - 1` bytes.
pub fn encode(record: &Record) -> SpoolResult<Frame> {
    Frame::seal(encode_payload(record)?)
}

/// Verifies and decodes a frame.
///
/// # Errors
///
/// Returns `SPOOL_CORRUPT_FRAME` if the checksum does not match or the payload
/// cannot be parsed.
pub fn decode(frame: &Frame) -> SpoolResult<Record> {
    frame.verify()?;
    decode_payload(frame.payload())
}

fn encode_payload(record: &Record) -> SpoolResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);
    buf.push(RECORD_FORMAT_VERSION);
    put_u32(&mut buf, check_payload_length(record.len() as u64)?);

    for field in record.fields() {
        put_bytes(&mut buf, field.name.as_bytes())?;
        buf.push(column_type_tag(field.column_type));
        put_value(&mut buf, &field.value)?;
    }

    Ok(buf)
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> SpoolResult<()> {
    put_u32(buf, check_payload_length(bytes.len() as u64)?);
    buf.extend_from_slice(bytes);
    Ok(())
}

fn put_value(buf: &mut Vec<u8>, value: &Value) -> SpoolResult<()> {
    match value {
        Value::Null => buf.push(VALUE_NULL),
        Value::String(s) => {
            buf.push(VALUE_STRING);
            put_bytes(buf, s.as_bytes())?;
        }
        Value::Long(v) => {
            buf.push(VALUE_LONG);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Value::Double(v) => {
            buf.push(VALUE_DOUBLE);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Value::Boolean(v) => {
            buf.push(VALUE_BOOLEAN);
            buf.push(u8::from(*v));
        }
        Value::Timestamp(ts) => {
            buf.push(VALUE_TIMESTAMP);
            buf.extend_from_slice(&ts.timestamp().to_le_bytes());
            buf.extend_from_slice(&ts.timestamp_subsec_nanos().to_le_bytes());
        }
        Value::Json(json) => {
            buf.push(VALUE_JSON);
            put_bytes(buf, json.to_string().as_bytes())?;
        }
    }
    Ok(())
}

fn column_type_tag(column_type: ColumnType) -> u8 {
    match column_type {
        ColumnType::String => 0,
        ColumnType::Long => 1,
        ColumnType::Double => 2,
        ColumnType::Boolean => 3,
        ColumnType::Timestamp => 4,
        ColumnType::Json => 5,
        ColumnType::Null => 6,
    }
}

fn column_type_from_tag(tag: u8) -> Option<ColumnType> {
    match tag {
        0 => Some(ColumnType::String),
        1 => Some(ColumnType::Long),
        2 => Some(ColumnType::Double),
        3 => Some(ColumnType::Boolean),
        4 => Some(ColumnType::Timestamp),
        5 => Some(ColumnType::Json),
        6 => Some(ColumnType::Null),
        _ => None,
    }
}

fn decode_payload(data: &[u8]) -> SpoolResult<Record> {
    let mut cursor = Cursor::new(data);

    let version = read_u8(&mut cursor)?;
    if version != RECORD_FORMAT_VERSION {
        return Err(SpoolError::corrupt_frame(format!(
            "unsupported record format version {}",
            version
        )));
    }

    let count = read_u32(&mut cursor)? as usize;
    // Every field takes at least 6 bytes; refuse counts the payload cannot hold.
    if count > data.len() / 6 {
        return Err(SpoolError::corrupt_frame(format!(
            "field count {} exceeds payload size {}",
            count,
            data.len()
        )));
    }

    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        let name = read_string(&mut cursor)?;
        let type_tag = read_u8(&mut cursor)?;
        let column_type = column_type_from_tag(type_tag).ok_or_else(|| {
            SpoolError::corrupt_frame(format!("unknown column type tag {}", type_tag))
        })?;
        let value = read_value(&mut cursor)?;
        fields.push(Field::new(name, column_type, value));
    }

    if cursor.position() != data.len() as u64 {
        return Err(SpoolError::corrupt_frame(format!(
            "{} trailing bytes after record",
            data.len() as u64 - cursor.position()
        )));
    }

    Ok(Record::new(fields))
}

fn read_value(cursor: &mut Cursor<&[u8]>) -> SpoolResult<Value> {
    let tag = read_u8(cursor)?;
    let value = match tag {
        VALUE_NULL => Value::Null,
        VALUE_STRING => Value::String(read_string(cursor)?),
        VALUE_LONG => Value::Long(i64::from_le_bytes(read_array(cursor)?)),
        VALUE_DOUBLE => Value::Double(f64::from_bits(u64::from_le_bytes(read_array(cursor)?))),
        VALUE_BOOLEAN => match read_u8(cursor)? {
            0 => Value::Boolean(false),
            1 => Value::Boolean(true),
            other => {
                return Err(SpoolError::corrupt_frame(format!(
                    "invalid boolean byte {}",
                    other
                )))
            }
        },
        VALUE_TIMESTAMP => {
            let seconds = i64::from_le_bytes(read_array(cursor)?);
            let nanos = read_u32(cursor)?;
            let ts = DateTime::from_timestamp(seconds, nanos).ok_or_else(|| {
                SpoolError::corrupt_frame(format!(
                    "timestamp out of range: {}s {}ns",
                    seconds, nanos
                ))
            })?;
            Value::Timestamp(ts)
        }
        VALUE_JSON => {
            let bytes = read_bytes(cursor)?;
            let json = serde_json::from_slice(&bytes)
                .map_err(|e| SpoolError::corrupt_frame(format!("invalid JSON value: {}", e)))?;
            Value::Json(json)
        }
        other => {
            return Err(SpoolError::corrupt_frame(format!(
                "unknown value tag {}",
                other
            )))
        }
    };
    Ok(value)
}

fn read_array<const N: usize>(cursor: &mut Cursor<&[u8]>) -> SpoolResult<[u8; N]> {
    let mut buf = [0u8; N];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| SpoolError::corrupt_frame("payload ends mid-field"))?;
    Ok(buf)
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> SpoolResult<u8> {
    Ok(read_array::<1>(cursor)?[0])
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> SpoolResult<u32> {
    Ok(u32::from_le_bytes(read_array(cursor)?))
}

fn read_bytes(cursor: &mut Cursor<&[u8]>) -> SpoolResult<Vec<u8>> {
    let len = read_u32(cursor)? as u64;
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if len > remaining {
        return Err(SpoolError::corrupt_frame(format!(
            "item length {} exceeds {} remaining payload bytes",
            len, remaining
        )));
    }
    let mut buf = vec![0u8; len as usize];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| SpoolError::corrupt_frame("payload ends mid-field"))?;
    Ok(buf)
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> SpoolResult<String> {
    String::from_utf8(read_bytes(cursor)?)
        .map_err(|e| SpoolError::corrupt_frame(format!("invalid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spool::SpoolErrorCode;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn every_type_record() -> Record {
        Record::new(vec![
            Field::new("name", ColumnType::String, Value::String("héllo, 世界".into())),
            Field::new("count", ColumnType::Long, Value::Long(-42)),
            Field::new("ratio", ColumnType::Double, Value::Double(3.25)),
            Field::new("active", ColumnType::Boolean, Value::Boolean(true)),
            Field::new(
                "at",
                ColumnType::Timestamp,
                Value::Timestamp(Utc.with_ymd_and_hms(2024, 2, 29, 12, 30, 0).unwrap()),
            ),
            Field::new("meta", ColumnType::Json, Value::Json(json!({"k": [1, 2, null]}))),
            Field::new("missing", ColumnType::String, Value::Null),
            Field::new("nothing", ColumnType::Null, Value::Null),
        ])
    }

    #[test]
    fn test_roundtrip_every_type() {
        let record = every_type_record();
        let frame = encode(&record).unwrap();
        assert_eq!(decode(&frame).unwrap(), record);
    }

    #[test]
    fn test_roundtrip_extremes() {
        let record = Record::new(vec![
            Field::new("min", ColumnType::Long, Value::Long(i64::MIN)),
            Field::new("max", ColumnType::Long, Value::Long(i64::MAX)),
            Field::new("neg_zero", ColumnType::Double, Value::Double(-0.0)),
            Field::new("inf", ColumnType::Double, Value::Double(f64::INFINITY)),
            Field::new("empty", ColumnType::String, Value::String(String::new())),
            Field::new(
                "pre_epoch",
                ColumnType::Timestamp,
                Value::Timestamp(DateTime::from_timestamp(-1, 999_999_999).unwrap()),
            ),
        ]);
        let decoded = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_roundtrip_empty_record() {
        let record = Record::default();
        assert_eq!(decode(&encode(&record).unwrap()).unwrap(), record);
    }

    #[test]
    fn test_any_payload_bit_flip_is_corrupt() {
        let frame = encode(&every_type_record()).unwrap();
        let payload = frame.payload().to_vec();

        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut damaged = payload.clone();
                damaged[byte] ^= 1 << bit;
                let err = decode(&Frame::from_parts(frame.checksum(), damaged)).unwrap_err();
                assert_eq!(err.code(), SpoolErrorCode::CorruptFrame);
            }
        }
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let frame = encode(&every_type_record()).unwrap();
        let mut payload = frame.payload().to_vec();
        payload[0] = 9;
        let err = decode(&Frame::seal(payload).unwrap()).unwrap_err();
        assert_eq!(err.code(), SpoolErrorCode::CorruptFrame);
        assert!(err.message().contains("version 9"));
    }

    #[test]
    fn test_trailing_bytes_are_corrupt() {
        let frame = encode(&every_type_record()).unwrap();
        let mut payload = frame.payload().to_vec();
        payload.push(0);
        let err = decode(&Frame::seal(payload).unwrap()).unwrap_err();
        assert!(err.message().contains("trailing"));
    }

    #[test]
    fn test_cut_payload_is_corrupt() {
        let frame = encode(&every_type_record()).unwrap();
        let mut payload = frame.payload().to_vec();
        payload.truncate(payload.len() - 3);
        let err = decode(&Frame::seal(payload).unwrap()).unwrap_err();
        assert_eq!(err.code(), SpoolErrorCode::CorruptFrame);
    }
}
