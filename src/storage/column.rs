//! Column File
//!
//! One read/write handle over one fixed-width column file, plus the raw
//! seek/read/write primitives everything above is built from.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, Key, Value, HEADER_LEN, KEY_WIDTH, TERMINATOR};
use crate::error::{CoreError, Result};
use crate::schema::ColumnDescriptor;

/// An open column file
#[derive(Debug)]
pub struct ColumnFile {
    /// Name and capacity from the digest
    descriptor: ColumnDescriptor,
    /// Path of `{name}.col`
    path: PathBuf,
    /// Read/write handle; cursor position is only meaningful right after a seek
    file: File,
}

impl ColumnFile {
    pub const EXTENSION: &'static str = "col";

    /// Path of the column file for `name` inside `table_dir`
    pub fn path_for(table_dir: &Path, name: &str) -> PathBuf {
        table_dir.join(format!("{}.{}", name, Self::EXTENSION))
    }

    /// Create a new, empty column file
    ///
    /// Fails with `ColumnAlreadyExists` if the file is already on disk.
    pub fn create(table_dir: &Path, descriptor: ColumnDescriptor) -> Result<Self> {
        let path = Self::path_for(table_dir, &descriptor.name);
        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CoreError::ColumnAlreadyExists(descriptor.name));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            descriptor,
            path,
            file,
        })
    }

    /// Open an existing column file
    ///
    /// The file length must be a whole number of records.
    pub fn open(table_dir: &Path, descriptor: ColumnDescriptor) -> Result<Self> {
        let path = Self::path_for(table_dir, &descriptor.name);
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        let record_len = codec::record_len(descriptor.capacity) as u64;
        if len % record_len != 0 {
            return Err(CoreError::Corrupt(format!(
                "column {} is {} bytes, not a multiple of its {}-byte record",
                descriptor.name, len, record_len
            )));
        }

        Ok(Self {
            descriptor,
            path,
            file,
        })
    }

    // =========================================================================
    // Raw Primitives
    // =========================================================================

    /// Move the cursor to the start of the file
    pub fn rewind(&mut self) -> Result<()> {
        self.file.rewind()?;
        Ok(())
    }

    /// Move the cursor by `delta` bytes, returning the new offset
    pub fn seek_relative(&mut self, delta: i64) -> Result<u64> {
        Ok(self.file.seek(SeekFrom::Current(delta))?)
    }

    /// Move the cursor to an absolute offset
    pub fn seek_to(&mut self, offset: u64) -> Result<u64> {
        Ok(self.file.seek(SeekFrom::Start(offset))?)
    }

    /// Current cursor offset
    pub fn offset(&mut self) -> Result<u64> {
        Ok(self.file.stream_position()?)
    }

    /// Read exactly `len` bytes at the cursor
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Write all of `bytes` at the cursor
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.file
            .write_all(bytes)
            .map_err(|source| CoreError::WriteFailed {
                column: self.descriptor.name.clone(),
                source,
            })
    }

    // =========================================================================
    // Record Access
    // =========================================================================

    /// Fail with `StalePosition` unless `position` starts the value field
    /// of a whole record inside the file
    pub fn check_value_position(&self, position: u64) -> Result<()> {
        let record_len = codec::record_len(self.descriptor.capacity) as u64;
        let value_end = position + (self.descriptor.capacity + TERMINATOR.len()) as u64;

        if position < HEADER_LEN as u64
            || (position - HEADER_LEN as u64) % record_len != 0
            || value_end > self.len()?
        {
            return Err(CoreError::StalePosition {
                column: self.descriptor.name.clone(),
                offset: position,
            });
        }
        Ok(())
    }

    /// Read and decode the value field starting at `position`
    pub fn read_value_at(&mut self, position: u64) -> Result<Value> {
        self.check_value_position(position)?;
        self.seek_to(position)?;
        let field = self.read_bytes(self.descriptor.capacity)?;
        codec::decode_field(&field)
    }

    /// Replace the value field at `position`; key and terminator stay untouched
    pub fn overwrite_value_at(&mut self, position: u64, field: &[u8]) -> Result<()> {
        debug_assert_eq!(field.len(), self.descriptor.capacity);
        self.check_value_position(position)?;
        self.seek_to(position)?;
        self.write_bytes(field)
    }

    /// Append a new record, returning the position of its value field
    pub fn append_record(&mut self, key: Key, field: &[u8]) -> Result<u64> {
        debug_assert_eq!(field.len(), self.descriptor.capacity);
        let start = self.file.seek(SeekFrom::End(0))?;
        self.write_bytes(&codec::encode_record(key, field))?;
        Ok(start + HEADER_LEN as u64)
    }

    /// Scan every record from the start of the file
    pub fn records(&mut self) -> Result<RecordScan<'_>> {
        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(0))?;
        Ok(RecordScan {
            reader,
            column: &self.descriptor.name,
            record_len: codec::record_len(self.descriptor.capacity),
            offset: 0,
        })
    }

    /// Largest key stored in this column
    pub fn max_key(&mut self) -> Result<Option<Key>> {
        let mut max = None;
        for record in self.records()? {
            max = max.max(record?.key);
        }
        Ok(max)
    }

    /// Flush file contents to disk
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn capacity(&self) -> usize {
        self.descriptor.capacity
    }

    pub fn descriptor(&self) -> &ColumnDescriptor {
        &self.descriptor
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Second handle on the same open file description (shares its lock)
    pub(super) fn handle(&self) -> io::Result<File> {
        self.file.try_clone()
    }
}

/// One record read during a scan
#[derive(Debug, Clone)]
pub struct ScannedRecord {
    /// Offset of the first key byte
    pub offset: u64,
    /// Parsed key, `None` when the key bytes are blank or malformed
    pub key: Option<Key>,
    /// Raw value field, still padded
    pub field: Vec<u8>,
}

impl ScannedRecord {
    /// Offset of the value field
    pub fn value_position(&self) -> u64 {
        self.offset + HEADER_LEN as u64
    }

    /// Value field with padding removed, lossily decoded for comparisons
    pub fn text(&self) -> String {
        String::from_utf8_lossy(codec::trim_pad(&self.field)).into_owned()
    }
}

/// Sequential iteration over all records of a column file
pub struct RecordScan<'a> {
    reader: BufReader<&'a File>,
    column: &'a str,
    record_len: usize,
    /// Offset of the next record
    offset: u64,
}

impl<'a> Iterator for RecordScan<'a> {
    type Item = Result<ScannedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buf = vec![0u8; self.record_len];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(CoreError::Io(e))),
            }
        }

        // Clean end of file
        if filled == 0 {
            return None;
        }

        if filled < buf.len() {
            return Some(Err(CoreError::Corrupt(format!(
                "torn record at offset {} in column {}",
                self.offset, self.column
            ))));
        }

        let terminator_at = self.record_len - TERMINATOR.len();
        if buf[KEY_WIDTH] != codec::DELIMITER || &buf[terminator_at..] != TERMINATOR {
            return Some(Err(CoreError::Corrupt(format!(
                "malformed record at offset {} in column {}",
                self.offset, self.column
            ))));
        }

        let record = ScannedRecord {
            offset: self.offset,
            key: Key::parse(&buf[..KEY_WIDTH]),
            field: buf[HEADER_LEN..terminator_at].to_vec(),
        };
        self.offset += self.record_len as u64;

        Some(Ok(record))
    }
}
