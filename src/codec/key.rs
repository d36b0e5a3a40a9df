//! Record keys
//!
//! Eight zero-padded decimal digits, shared by every column file that
//! holds a value for the same record.

use std::fmt;

use crate::config::MAX_KEY;

use super::KEY_WIDTH;

/// Table-wide record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u32);

impl Key {
    /// Create a key, `None` above `MAX_KEY`
    pub fn new(value: u32) -> Option<Self> {
        (value <= MAX_KEY).then_some(Self(value))
    }

    /// Numeric value of the key
    pub fn value(self) -> u32 {
        self.0
    }

    /// The key after this one, `None` once the key space is exhausted
    pub fn next(self) -> Option<Self> {
        Self::new(self.0.checked_add(1)?)
    }

    /// Parse the 8-byte key header of a record
    ///
    /// Returns `None` for blank or malformed keys.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_WIDTH || !bytes.iter().all(u8::is_ascii_digit) {
            return None;
        }
        let value = bytes
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        Self::new(value)
    }

    /// Zero-padded on-disk form
    pub fn to_bytes(self) -> [u8; KEY_WIDTH] {
        let mut out = [b'0'; KEY_WIDTH];
        let mut n = self.0;
        for slot in out.iter_mut().rev() {
            *slot = b'0' + (n % 10) as u8;
            n /= 10;
        }
        out
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}
