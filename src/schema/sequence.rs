//! Key sequence
//!
//! The single authoritative counter for record keys. Only touched while
//! the table lock is held.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::codec::Key;
use crate::error::{CoreError, Result};

/// Last issued key of a table
#[derive(Debug, Clone)]
pub struct Sequence {
    path: PathBuf,
}

impl Sequence {
    pub const FILENAME: &'static str = "digest.seq";

    pub fn new(table_dir: &Path) -> Self {
        Self {
            path: table_dir.join(Self::FILENAME),
        }
    }

    /// Read the last issued key
    ///
    /// Returns:
    /// - `Ok(Some(key))`: the sequence file holds a key
    /// - `Ok(None)`: no sequence file yet
    pub fn last(&self) -> Result<Option<Key>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value: u32 = text
            .trim()
            .parse()
            .map_err(|_| CoreError::Corrupt(format!("bad key sequence {:?}", text.trim())))?;

        Key::new(value)
            .map(Some)
            .ok_or_else(|| CoreError::Corrupt(format!("key sequence {} out of range", value)))
    }

    /// Record `key` as the last issued key
    pub fn store(&self, key: Key) -> Result<()> {
        fs::write(&self.path, key.value().to_string())?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
