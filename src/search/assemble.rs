//! Record assembly
//!
//! Reads the value fields behind resolved positions and groups them by key.

use std::collections::HashMap;

use crate::codec::{Key, Value};
use crate::error::{CoreError, Result};
use crate::storage::ColumnStore;

use super::ColumnPositions;

/// One logical record: every column that holds a value for a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    key: Key,
    /// (column, value) in schema order
    fields: Vec<(String, Value)>,
}

impl Record {
    fn new(key: Key) -> Self {
        Self {
            key,
            fields: Vec::new(),
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    /// Value of `column`, `None` if this record has no value there
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A later position for the same column replaces the earlier one
    fn set(&mut self, column: &str, value: Value) {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column.to_string(), value)),
        }
    }
}

/// Build records from positions
///
/// Record order follows first appearance: schema order, then file order.
/// Fails with `RecordNotFound` when no position resolved to a value.
pub(crate) fn assemble(store: &mut ColumnStore, positions: &[ColumnPositions]) -> Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    let mut slots: HashMap<Key, usize> = HashMap::new();

    for column_positions in positions {
        let Some(column) = store.get_mut(&column_positions.column) else {
            return Err(CoreError::ColumnNotFound(column_positions.column.clone()));
        };

        for position in &column_positions.entries {
            let value = column.read_value_at(position.offset)?;
            let slot = *slots.entry(position.key).or_insert_with(|| {
                records.push(Record::new(position.key));
                records.len() - 1
            });
            records[slot].set(&column_positions.column, value);
        }
    }

    if records.is_empty() {
        return Err(CoreError::RecordNotFound);
    }
    Ok(records)
}
