//! Value field encoding/decoding
//!
//! Encoding never truncates: a value that does not fit its column is
//! refused, and callers check every field before writing any of them.

use crate::error::{CoreError, Result};

use super::{Key, Value, DELIMITER, PAD, TERMINATOR};

/// Encode a value into a field of exactly `capacity` bytes
///
/// Lists are joined with `|`, then right-padded with `_`.
/// Returns `None` when the joined value is longer than `capacity`.
pub fn encode_field(value: &Value, capacity: usize) -> Option<Vec<u8>> {
    let joined = value.joined();
    if joined.len() > capacity {
        return None;
    }

    let mut field = Vec::with_capacity(capacity);
    field.extend_from_slice(joined.as_bytes());
    field.resize(capacity, PAD);
    Some(field)
}

/// Strip the trailing `_` padding from a value field
pub fn trim_pad(field: &[u8]) -> &[u8] {
    let end = field
        .iter()
        .rposition(|&b| b != PAD)
        .map_or(0, |i| i + 1);
    &field[..end]
}

/// Decode a value field: strip trailing pad, split lists
pub fn decode_field(field: &[u8]) -> Result<Value> {
    let raw = std::str::from_utf8(trim_pad(field))
        .map_err(|e| CoreError::Corrupt(format!("value field is not UTF-8: {}", e)))?;

    Ok(Value::from_raw(raw))
}

/// Build a complete record: key, delimiter, encoded field, terminator
pub fn encode_record(key: Key, field: &[u8]) -> Vec<u8> {
    let key_bytes = key.to_bytes();
    let mut record = Vec::with_capacity(key_bytes.len() + 1 + field.len() + TERMINATOR.len());
    record.extend_from_slice(&key_bytes);
    record.push(DELIMITER);
    record.extend_from_slice(field);
    record.extend_from_slice(TERMINATOR);
    record
}
