//! Linear scan
//!
//! Resolves a query to record keys by reading column files front to back.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::codec::Key;
use crate::error::{CoreError, Result};
use crate::guard;
use crate::storage::ColumnStore;

use super::SearchQuery;

/// Find the keys matching `query`
///
/// Columns are scanned in schema order and matches are counted across all
/// of them: the scan stops as soon as `limit` matches were seen, so an
/// earlier column can use up the whole limit.
///
/// Post-processing: duplicates and blank keys are dropped, and if more
/// than `limit` keys remain only the last one is cut.
pub(crate) fn scan_keys(store: &mut ColumnStore, query: &SearchQuery) -> Result<Vec<Key>> {
    if let Some(term) = query.search_term() {
        guard::check_phrase(term)?;
    }

    let selected = select_columns(store, query.search_columns())?;
    let limit = query.effective_limit();

    // Blank keys still count toward the limit
    let mut hits: Vec<Option<Key>> = Vec::new();

    'columns: for index in selected {
        let column = store.column_at_mut(index);
        for record in column.records()? {
            let record = record?;
            if !query.matches(&record.text()) {
                continue;
            }

            hits.push(record.key);
            if hits.len() >= limit {
                break 'columns;
            }
        }
    }

    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(hits.len());
    for hit in hits {
        match hit {
            Some(key) => {
                if seen.insert(key) {
                    keys.push(key);
                }
            }
            None => warn!("Skipping record with blank key"),
        }
    }

    if keys.len() > limit {
        keys.pop();
    }

    if keys.is_empty() {
        return Err(CoreError::RecordNotFound);
    }

    debug!(
        term = query.search_term().unwrap_or("*"),
        limit,
        matches = keys.len(),
        "Search resolved keys"
    );
    Ok(keys)
}

/// Schema indices of the columns to scan, in schema order
fn select_columns(store: &ColumnStore, names: &[String]) -> Result<Vec<usize>> {
    if names.is_empty() {
        return Ok((0..store.len()).collect());
    }

    let mut indices = names
        .iter()
        .map(|name| {
            store
                .index_of(name)
                .ok_or_else(|| CoreError::ColumnNotFound(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}
