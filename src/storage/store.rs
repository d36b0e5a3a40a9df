//! Column Store
//!
//! Owns every column file of a table.
//!
//! ## Responsibilities
//! - Check that digest and column files agree on startup
//! - Hand out column files by schema index or name
//! - Acquire the table-wide write lock

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::codec::Key;
use crate::error::{CoreError, Result};
use crate::schema::Digest;

use super::lock::TableLock;
use super::ColumnFile;

/// All column files of one table, in schema order
#[derive(Debug)]
pub struct ColumnStore {
    /// Table directory
    table_dir: PathBuf,

    /// One open file per digest column, same order as the digest
    columns: Vec<ColumnFile>,

    /// Pause before the second lock attempt
    lock_retry_delay: Duration,
}

impl ColumnStore {
    /// Open the column files named by `digest`
    ///
    /// On startup:
    /// 1. Discover `.col` files in the table directory
    /// 2. Every digest column must have a file, every file a digest column
    /// 3. Open a read/write handle for each, in schema order
    pub fn open(table_dir: &Path, digest: &Digest, lock_retry_delay: Duration) -> Result<Self> {
        let mut on_disk: HashSet<String> = HashSet::new();
        for entry in fs::read_dir(table_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                if let Some(name) = Self::parse_column_name(&path) {
                    on_disk.insert(name);
                }
            }
        }

        for column in digest.columns() {
            if !on_disk.remove(&column.name) {
                return Err(CoreError::SchemaMismatch(format!(
                    "column {} has no column file",
                    column.name
                )));
            }
        }

        if let Some(stray) = on_disk.into_iter().next() {
            return Err(CoreError::SchemaMismatch(format!(
                "column file {} is not in the digest",
                stray
            )));
        }

        let columns = digest
            .columns()
            .iter()
            .map(|descriptor| ColumnFile::open(table_dir, descriptor.clone()))
            .collect::<Result<Vec<_>>>()?;

        debug!(table = %table_dir.display(), columns = columns.len(), "Opened column store");

        Ok(Self {
            table_dir: table_dir.to_path_buf(),
            columns,
            lock_retry_delay,
        })
    }

    /// Register a freshly created column file (appended to schema order)
    pub fn add(&mut self, column: ColumnFile) {
        self.columns.push(column);
    }

    /// Lock every open column file, in schema order
    ///
    /// Each file gets two attempts: immediately, then once more after
    /// `lock_retry_delay`. Locks are released when the guard drops.
    pub fn lock_all(&self) -> Result<TableLock> {
        let mut lock = TableLock::empty();
        for column in &self.columns {
            lock.acquire(column, self.lock_retry_delay)?;
        }
        debug!(table = %self.table_dir.display(), files = lock.len(), "Acquired table lock");
        Ok(lock)
    }

    /// Largest key in any column file
    pub fn max_key(&mut self) -> Result<Option<Key>> {
        let mut max = None;
        for column in &mut self.columns {
            max = max.max(column.max_key()?);
        }
        Ok(max)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn columns(&self) -> &[ColumnFile] {
        &self.columns
    }

    pub fn column_at_mut(&mut self, index: usize) -> &mut ColumnFile {
        &mut self.columns[index]
    }

    /// Schema index of a column
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ColumnFile> {
        self.columns.iter_mut().find(|c| c.name() == name)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ColumnFile> {
        self.columns.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn table_dir(&self) -> &Path {
        &self.table_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Column name from a column file path
    /// "firstName.col" → Some("firstName")
    fn parse_column_name(path: &Path) -> Option<String> {
        if path.extension()? != ColumnFile::EXTENSION {
            return None;
        }
        Some(path.file_stem()?.to_string_lossy().into_owned())
    }
}
