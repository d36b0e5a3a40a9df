//! Codec Module
//!
//! Fixed-width record format shared by every column file.
//!
//! ## Record Format
//! ```text
//! ┌──────────────┬───────┬──────────────────────────────┬──────────┐
//! │ Key (8)      │ '|'   │ Value (capacity, '_' padded) │ "\r\n"   │
//! │ "00000042"   │  (1)  │ "red|blue________________"   │   (2)    │
//! └──────────────┴───────┴──────────────────────────────┴──────────┘
//! ```
//!
//! Records carry no length prefix: the record size is `capacity + 11`,
//! so a column file only makes sense next to its digest entry.
//!
//! A decoded value containing `|` is a list, anything else is a scalar.

mod field;
mod key;
mod value;

pub use field::{decode_field, encode_field, encode_record, trim_pad};
pub use key::Key;
pub use value::Value;

// =============================================================================
// Layout Constants
// =============================================================================

/// Width of the zero-padded decimal key
pub const KEY_WIDTH: usize = 8;

/// Separates key from value, and list items from each other
pub const DELIMITER: u8 = b'|';

/// Right-pads values to their column capacity
pub const PAD: u8 = b'_';

/// Closes every record
pub const TERMINATOR: &[u8; 2] = b"\r\n";

/// Bytes before the value field: key + delimiter
pub const HEADER_LEN: usize = KEY_WIDTH + 1;

/// Bytes in a record that are not value: header + terminator
pub const RECORD_OVERHEAD: usize = HEADER_LEN + TERMINATOR.len();

/// Full on-disk length of one record for a column of `capacity`
pub const fn record_len(capacity: usize) -> usize {
    capacity + RECORD_OVERHEAD
}
