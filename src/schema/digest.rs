//! Digest
//!
//! Persists the ordered list of `{name, capacity}` column descriptors.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{MAX_CAPACITY, MIN_CAPACITY};
use crate::error::{CoreError, Result};

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name, also the stem of its column file
    pub name: String,

    /// Maximum encoded byte length of a value in this column
    pub capacity: usize,
}

/// The schema of a table, bound to its digest file
#[derive(Debug, Clone)]
pub struct Digest {
    /// Path of `digest.json`
    path: PathBuf,

    /// Column descriptors in creation order
    columns: Vec<ColumnDescriptor>,
}

impl Digest {
    pub const FILENAME: &'static str = "digest.json";

    /// Write an empty digest into an existing table directory
    pub fn create(table_dir: &Path) -> Result<Self> {
        let path = table_dir.join(Self::FILENAME);
        if path.exists() {
            return Err(CoreError::TableAlreadyExists(table_dir.to_path_buf()));
        }

        let digest = Self {
            path,
            columns: Vec::new(),
        };
        digest.save()?;
        Ok(digest)
    }

    /// Load the digest of a table
    ///
    /// Checks, in order: the directory exists, it is writable, the digest
    /// file exists, the digest parses and every descriptor is sane.
    ///
    /// "Writable" means the directory mode has a write bit set. This is not
    /// an effective-access check: a directory owned by another user can pass
    /// it, and a later write then fails with `Io`.
    pub fn load(table_dir: &Path) -> Result<Self> {
        if !table_dir.is_dir() {
            return Err(CoreError::TableNotFound(table_dir.to_path_buf()));
        }
        if fs::metadata(table_dir)?.permissions().readonly() {
            return Err(CoreError::TableNotWritable(table_dir.to_path_buf()));
        }

        let path = table_dir.join(Self::FILENAME);
        if !path.is_file() {
            return Err(CoreError::DigestMissing(path));
        }

        let bytes = fs::read(&path)?;
        let columns: Vec<ColumnDescriptor> = serde_json::from_slice(&bytes)?;

        for (i, column) in columns.iter().enumerate() {
            if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&column.capacity) {
                return Err(CoreError::Corrupt(format!(
                    "column {} has capacity {} outside [{}, {}]",
                    column.name, column.capacity, MIN_CAPACITY, MAX_CAPACITY
                )));
            }
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(CoreError::Corrupt(format!(
                    "column {} declared twice",
                    column.name
                )));
            }
        }

        Ok(Self { path, columns })
    }

    /// Append a column descriptor and rewrite the digest file
    ///
    /// Capacity is clamped into `[MIN_CAPACITY, MAX_CAPACITY]`.
    pub fn add_column(&mut self, name: &str, capacity: usize) -> Result<&ColumnDescriptor> {
        if self.column(name).is_some() {
            return Err(CoreError::ColumnAlreadyExists(name.to_string()));
        }

        self.columns.push(ColumnDescriptor {
            name: name.to_string(),
            capacity: Self::clamp_capacity(capacity),
        });

        if let Err(e) = self.save() {
            self.columns.pop();
            return Err(e);
        }

        let added = &self.columns[self.columns.len() - 1];
        info!(column = %added.name, capacity = added.capacity, "Added column to digest");
        Ok(added)
    }

    /// Rewrite the whole digest file
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.columns)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Column descriptors in schema order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Path of the digest file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn clamp_capacity(capacity: usize) -> usize {
        capacity.clamp(MIN_CAPACITY, MAX_CAPACITY)
    }
}
