//! Position resolution
//!
//! Maps matched keys to the offsets of their value fields in every column,
//! not only the columns that were searched.

use std::collections::HashSet;

use crate::codec::Key;
use crate::error::Result;
use crate::storage::ColumnStore;

use super::{ColumnPositions, Position};

pub(crate) fn resolve_positions(store: &mut ColumnStore, keys: &[Key]) -> Result<Vec<ColumnPositions>> {
    let wanted: HashSet<Key> = keys.iter().copied().collect();
    let mut resolved = Vec::with_capacity(store.len());

    for column in store.iter_mut() {
        let mut entries = Vec::new();
        let name = column.name().to_string();

        for record in column.records()? {
            let record = record?;
            if let Some(key) = record.key.filter(|k| wanted.contains(k)) {
                entries.push(Position {
                    key,
                    offset: record.value_position(),
                });
            }
        }

        resolved.push(ColumnPositions {
            column: name,
            entries,
        });
    }

    Ok(resolved)
}
