//! Search Module
//!
//! Read path of a table:
//!
//! ```text
//!   SearchQuery ──scan──▶ keys ──resolve──▶ positions ──assemble──▶ Records
//!                         └──────────── Cursor ────────────┘
//! ```
//!
//! A `Cursor` is the result of one search. Reads borrow it; writes consume
//! it, since appended records make its positions stale. It remembers the
//! table that produced it, and only that table accepts it back.

mod assemble;
mod query;
mod resolve;
mod scan;

use std::path::{Path, PathBuf};

use crate::codec::Key;

pub use assemble::Record;
pub use query::SearchQuery;

pub(crate) use assemble::assemble;
pub(crate) use resolve::resolve_positions;
pub(crate) use scan::scan_keys;

/// Offset of one key's value field inside one column file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub key: Key,
    pub offset: u64,
}

/// Resolved positions for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPositions {
    pub column: String,
    /// In file order; a column without a value for a key has no entry
    pub entries: Vec<Position>,
}

/// Handle produced by a search
#[derive(Debug, Clone)]
pub struct Cursor {
    /// Canonical directory of the table that ran the search
    table: PathBuf,
    keys: Vec<Key>,
    positions: Vec<ColumnPositions>,
}

impl Cursor {
    pub(crate) fn new(table: PathBuf, keys: Vec<Key>, positions: Vec<ColumnPositions>) -> Self {
        Self {
            table,
            keys,
            positions,
        }
    }

    /// Canonical directory of the table this cursor belongs to
    pub fn table(&self) -> &Path {
        &self.table
    }

    /// Matched keys, deduplicated, in match order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Positions per column, schema order
    pub fn positions(&self) -> &[ColumnPositions] {
        &self.positions
    }

    /// Value positions of `key` in `column`
    pub fn positions_of<'a>(&'a self, column: &'a str, key: Key) -> impl Iterator<Item = u64> + 'a {
        self.positions
            .iter()
            .filter(move |c| c.column == column)
            .flat_map(|c| c.entries.iter())
            .filter(move |p| p.key == key)
            .map(|p| p.offset)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
