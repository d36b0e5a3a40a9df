//! Engine Module
//!
//! The table engine that coordinates digest, column files and searches.
//!
//! ## Responsibilities
//! - Create and open tables, add columns
//! - Run searches and hand out cursors
//! - Validate every affected field before writing any of them

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::codec::{self, Key, Value};
use crate::config::{Config, DEFAULT_CAPACITY};
use crate::error::{CoreError, Result};
use crate::guard;
use crate::report::{self, ErrorMode, Outcome};
use crate::schema::{ColumnDescriptor, Digest, Sequence};
use crate::search::{self, Cursor, Record, SearchQuery};
use crate::storage::{ColumnFile, ColumnStore};

/// A table: a directory of column files plus its digest
///
/// ## Concurrency Model
///
/// - **Within a process**: all file access goes through one `Mutex`, so a
///   `Table` can be shared between threads.
/// - **Across processes**: every write first locks every column file of the
///   table (advisory, exclusive). Reads take no file locks, so a reader can
///   observe a concurrent writer's partial progress.
///
/// ## Write Protocol
///
/// 1. Sanitize input
/// 2. Lock all column files (two attempts each)
/// 3. Encode every affected field; any overflow aborts with nothing written
/// 4. Advance the key sequence (insert only)
/// 5. Check every overwrite position, then write the fields
pub struct Table {
    /// Table configuration
    config: Config,

    /// Canonical table directory, stamped on every cursor
    identity: PathBuf,

    /// Column descriptors, kept in sync with the column store
    digest: Digest,

    /// Authoritative key counter
    sequence: Sequence,

    /// Open column files
    store: Mutex<ColumnStore>,
}

/// Where a planned write lands
#[derive(Debug, Clone, Copy)]
enum Target {
    /// Replace the value field at this offset
    Overwrite(u64),
    /// Append a fresh record for this key
    Append(Key),
}

/// A fully encoded write, produced by the validation pass
#[derive(Debug)]
struct PlannedWrite {
    column: usize,
    target: Target,
    field: Vec<u8>,
}

impl Table {
    /// Create a new, empty table and open it
    ///
    /// Creates the table directory if needed and writes an empty digest.
    pub fn create(config: Config) -> Result<Self> {
        let dir = &config.table_dir;
        if dir.join(Digest::FILENAME).exists() {
            return Err(CoreError::TableAlreadyExists(dir.clone()));
        }

        fs::create_dir_all(dir)?;
        Digest::create(dir)?;
        info!(table = %dir.display(), "Created table");

        Self::open(config)
    }

    /// Open an existing table
    pub fn open(config: Config) -> Result<Self> {
        let dir = config.table_dir.clone();
        let digest = Digest::load(&dir)?;
        let store = ColumnStore::open(&dir, &digest, config.lock_retry_delay)?;
        let identity = fs::canonicalize(&dir)?;

        Ok(Self {
            sequence: Sequence::new(&dir),
            config,
            identity,
            digest,
            store: Mutex::new(store),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified table directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().table_dir(path).build())
    }

    // =========================================================================
    // Schema
    // =========================================================================

    /// Add a column with the given capacity (clamped into `[1, 100]`)
    pub fn create_column(&mut self, name: &str, capacity: usize) -> Result<()> {
        guard::check_name(name)?;

        let store = self.store.get_mut();
        let _lock = store.lock_all()?;

        if self.digest.column(name).is_some() {
            return Err(CoreError::ColumnAlreadyExists(name.to_string()));
        }

        let descriptor = ColumnDescriptor {
            name: name.to_string(),
            capacity: Digest::clamp_capacity(capacity),
        };
        let file = ColumnFile::create(&self.config.table_dir, descriptor)?;

        if let Err(e) = self.digest.add_column(name, capacity) {
            if let Err(remove_err) = fs::remove_file(file.path()) {
                warn!(
                    path = %file.path().display(),
                    error = %remove_err,
                    "Failed to remove column file after digest write failed"
                );
            }
            return Err(e);
        }

        info!(column = name, capacity = file.capacity(), "Created column");
        store.add(file);
        Ok(())
    }

    /// Add a column with `DEFAULT_CAPACITY`
    pub fn create_column_default(&mut self, name: &str) -> Result<()> {
        self.create_column(name, DEFAULT_CAPACITY)
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a new record under a freshly generated key
    ///
    /// `values` may name any subset of the columns (at least one).
    pub fn insert<I, C, V>(&self, values: I) -> Result<Key>
    where
        I: IntoIterator<Item = (C, V)>,
        C: AsRef<str>,
        V: Into<Value>,
    {
        let mut targets: BTreeMap<usize, Value> = BTreeMap::new();
        for (column, value) in values {
            let value = value.into();
            guard::check_value(&value)?;
            targets.insert(self.column_index(column.as_ref())?, value);
        }
        if targets.is_empty() {
            return Err(CoreError::EmptyRecord);
        }

        let mut store = self.store.lock();
        let _lock = store.lock_all()?;

        let key = self.next_key(&mut store)?;

        let plan = targets
            .iter()
            .map(|(&column, value)| {
                Ok(PlannedWrite {
                    column,
                    target: Target::Append(key),
                    field: self.encode_for(column, value)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // A gap after a failed commit is harmless, a reused key is not
        self.sequence.store(key)?;
        self.commit(&mut store, plan)?;

        info!(key = %key, columns = targets.len(), "Inserted record");
        Ok(key)
    }

    // =========================================================================
    // Search / Read
    // =========================================================================

    /// Resolve a query to a cursor over the matching records
    pub fn search(&self, query: &SearchQuery) -> Result<Cursor> {
        let mut store = self.store.lock();
        let keys = search::scan_keys(&mut store, query)?;
        let positions = search::resolve_positions(&mut store, &keys)?;
        Ok(Cursor::new(self.identity.clone(), keys, positions))
    }

    /// First record behind a cursor
    pub fn read_first(&self, cursor: &Cursor) -> Result<Record> {
        self.read_all(cursor)?
            .into_iter()
            .next()
            .ok_or(CoreError::RecordNotFound)
    }

    /// Every record behind a cursor
    pub fn read_all(&self, cursor: &Cursor) -> Result<Vec<Record>> {
        self.check_cursor(cursor)?;
        let mut store = self.store.lock();
        search::assemble(&mut store, cursor.positions())
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Write `value` into `columns` (empty: all) of every record behind the cursor
    ///
    /// Existing values are overwritten in place; a record without a value
    /// in a target column gets a new record appended under its key.
    pub fn overwrite_or_append(
        &self,
        cursor: Cursor,
        value: impl Into<Value>,
        columns: &[&str],
    ) -> Result<()> {
        self.check_cursor(&cursor)?;
        let value = value.into();
        guard::check_value(&value)?;
        let targets = self.target_columns(columns)?;

        let mut store = self.store.lock();
        let _lock = store.lock_all()?;

        let mut plan = Vec::new();
        for column in targets {
            let field = self.encode_for(column, &value)?;
            let name = self.column_name(column);

            for &key in cursor.keys() {
                let offsets: Vec<u64> = cursor.positions_of(name, key).collect();
                if offsets.is_empty() {
                    plan.push(PlannedWrite {
                        column,
                        target: Target::Append(key),
                        field: field.clone(),
                    });
                }
                for offset in offsets {
                    plan.push(PlannedWrite {
                        column,
                        target: Target::Overwrite(offset),
                        field: field.clone(),
                    });
                }
            }
        }

        let writes = plan.len();
        self.commit(&mut store, plan)?;
        info!(records = cursor.len(), writes, "Overwrote records");
        Ok(())
    }

    /// Append `item` to the list in `columns` (empty: all) of every record
    ///
    /// An empty or missing value becomes the scalar `item`.
    pub fn list_append(&self, cursor: Cursor, item: &str, columns: &[&str]) -> Result<()> {
        self.check_cursor(&cursor)?;
        guard::check_item(item)?;
        let targets = self.target_columns(columns)?;

        let mut store = self.store.lock();
        let _lock = store.lock_all()?;

        let mut plan = Vec::new();
        for column in targets {
            let name = self.column_name(column);

            for &key in cursor.keys() {
                let offsets: Vec<u64> = cursor.positions_of(name, key).collect();
                if offsets.is_empty() {
                    plan.push(PlannedWrite {
                        column,
                        target: Target::Append(key),
                        field: self.encode_for(column, &Value::scalar(item))?,
                    });
                }
                for offset in offsets {
                    let current = store.column_at_mut(column).read_value_at(offset)?;
                    let value = if current.is_empty() {
                        Value::scalar(item)
                    } else {
                        Value::from_raw(&format!("{}|{}", current.joined(), item))
                    };
                    plan.push(PlannedWrite {
                        column,
                        target: Target::Overwrite(offset),
                        field: self.encode_for(column, &value)?,
                    });
                }
            }
        }

        let writes = plan.len();
        self.commit(&mut store, plan)?;
        info!(item, writes, "Attached list item");
        Ok(())
    }

    /// Remove one `item` from the list in `columns` (empty: all) of every record
    ///
    /// Fails with `NotAList` if a value holds no `|`, `ItemNotFound` if the
    /// item is absent, and `RecordNotFound` if no matched record has a value
    /// in any target column. Removing from a two-item list leaves a scalar.
    pub fn list_remove(
        &self,
        cursor: Cursor,
        item: &str,
        columns: &[&str],
        case_sensitive: bool,
    ) -> Result<()> {
        self.check_cursor(&cursor)?;
        guard::check_item(item)?;
        let targets = self.target_columns(columns)?;

        let mut store = self.store.lock();
        let _lock = store.lock_all()?;

        let mut plan = Vec::new();
        for column in targets {
            let name = self.column_name(column);

            for &key in cursor.keys() {
                for offset in cursor.positions_of(name, key) {
                    let Value::List(mut items) = store.column_at_mut(column).read_value_at(offset)?
                    else {
                        return Err(CoreError::NotAList {
                            column: name.to_string(),
                            key: key.to_string(),
                        });
                    };

                    let found = items.iter().position(|candidate| {
                        if case_sensitive {
                            candidate == item
                        } else {
                            candidate.to_lowercase() == item.to_lowercase()
                        }
                    });
                    let Some(at) = found else {
                        return Err(CoreError::ItemNotFound {
                            column: name.to_string(),
                            key: key.to_string(),
                            item: item.to_string(),
                        });
                    };

                    items.remove(at);
                    let value = Value::from_raw(&items.join("|"));
                    plan.push(PlannedWrite {
                        column,
                        target: Target::Overwrite(offset),
                        field: self.encode_for(column, &value)?,
                    });
                }
            }
        }

        if plan.is_empty() {
            return Err(CoreError::RecordNotFound);
        }

        let writes = plan.len();
        self.commit(&mut store, plan)?;
        info!(item, writes, "Detached list item");
        Ok(())
    }

    // =========================================================================
    // Boundary
    // =========================================================================

    /// Switch between reporting and swallowing errors at the boundary
    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.config.error_mode = mode;
    }

    /// Apply this table's error mode to an operation result
    pub fn settle<T>(&self, result: Result<T>) -> Outcome<T> {
        report::settle(result, self.config.error_mode)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Column descriptors in schema order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.digest.columns()
    }

    pub fn table_dir(&self) -> &Path {
        &self.config.table_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Reject a cursor produced by a different table
    fn check_cursor(&self, cursor: &Cursor) -> Result<()> {
        if cursor.table() != self.identity.as_path() {
            return Err(CoreError::ForeignCursor(cursor.table().to_path_buf()));
        }
        Ok(())
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.digest
            .columns()
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))
    }

    fn column_name(&self, index: usize) -> &str {
        &self.digest.columns()[index].name
    }

    /// Schema indices of the write targets, in schema order (empty: all)
    fn target_columns(&self, columns: &[&str]) -> Result<Vec<usize>> {
        if columns.is_empty() {
            return Ok((0..self.digest.columns().len()).collect());
        }

        let mut indices = columns
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();
        indices.dedup();
        Ok(indices)
    }

    /// Encode `value` for the column at `index`, or fail with `CapacityExceeded`
    fn encode_for(&self, index: usize, value: &Value) -> Result<Vec<u8>> {
        let descriptor = &self.digest.columns()[index];
        codec::encode_field(value, descriptor.capacity).ok_or_else(|| CoreError::CapacityExceeded {
            column: descriptor.name.clone(),
            capacity: descriptor.capacity,
            len: value.joined().len(),
        })
    }

    /// Next key from the sequence, seeded from the column files if absent
    fn next_key(&self, store: &mut ColumnStore) -> Result<Key> {
        let last = match self.sequence.last()? {
            Some(key) => Some(key),
            None => store.max_key()?,
        };

        let next = match last {
            Some(key) => key.next(),
            None => Key::new(1),
        };
        next.ok_or(CoreError::KeyLimitExceeded)
    }

    /// Apply a validated plan, then sync the touched files
    ///
    /// Every overwrite position is checked against the current files first,
    /// so a stale position aborts the plan before any byte is written.
    fn commit(&self, store: &mut ColumnStore, plan: Vec<PlannedWrite>) -> Result<()> {
        for write in &plan {
            if let Target::Overwrite(offset) = write.target {
                store.columns()[write.column].check_value_position(offset)?;
            }
        }

        let mut touched = BTreeSet::new();

        for write in plan {
            let column = store.column_at_mut(write.column);
            match write.target {
                Target::Overwrite(offset) => column.overwrite_value_at(offset, &write.field)?,
                Target::Append(key) => {
                    column.append_record(key, &write.field)?;
                }
            }
            touched.insert(write.column);
        }

        if self.config.sync_writes {
            for index in touched {
                store.column_at_mut(index).sync()?;
            }
        }
        Ok(())
    }
}
