//! Tests for ColumnFile and ColumnStore
//!
//! These tests verify:
//! - Creating/opening column files
//! - Append, overwrite and read at positions
//! - Record scans and torn-record detection
//! - Digest vs. column file agreement on open
//! - Table-wide locking with a single retry

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use coltab::codec::{encode_field, Key, Value, HEADER_LEN};
use coltab::schema::{ColumnDescriptor, Digest};
use coltab::storage::{ColumnFile, ColumnStore};
use coltab::CoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn descriptor(name: &str, capacity: usize) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        capacity,
    }
}

fn key(n: u32) -> Key {
    Key::new(n).unwrap()
}

fn field(value: &str, capacity: usize) -> Vec<u8> {
    encode_field(&Value::scalar(value), capacity).unwrap()
}

/// Digest + empty column files for the given columns
fn create_table_with_columns(path: &PathBuf, columns: &[(&str, usize)]) -> Digest {
    let mut digest = Digest::create(path).unwrap();
    for (name, capacity) in columns {
        digest.add_column(name, *capacity).unwrap();
        ColumnFile::create(path, descriptor(name, *capacity)).unwrap();
    }
    digest
}

// =============================================================================
// ColumnFile Tests
// =============================================================================

#[test]
fn test_create_column_file() {
    let (_temp, path) = setup_temp_table();

    let column = ColumnFile::create(&path, descriptor("email", 40)).unwrap();

    assert_eq!(column.name(), "email");
    assert_eq!(column.capacity(), 40);
    assert_eq!(column.path(), path.join("email.col"));
    assert!(column.is_empty().unwrap());
}

#[test]
fn test_create_existing_column_file_fails() {
    let (_temp, path) = setup_temp_table();

    ColumnFile::create(&path, descriptor("email", 40)).unwrap();
    let err = ColumnFile::create(&path, descriptor("email", 40)).unwrap_err();

    assert!(matches!(err, CoreError::ColumnAlreadyExists(_)));
}

#[test]
fn test_append_writes_fixed_width_record() {
    let (_temp, path) = setup_temp_table();
    let mut column = ColumnFile::create(&path, descriptor("name", 6)).unwrap();

    let first = column.append_record(key(1), &field("John", 6)).unwrap();
    let second = column.append_record(key(2), &field("Ann", 6)).unwrap();

    assert_eq!(first, HEADER_LEN as u64);
    assert_eq!(second, 17 + HEADER_LEN as u64);
    let bytes = fs::read(path.join("name.col")).unwrap();
    assert_eq!(bytes, b"00000001|John__\r\n00000002|Ann___\r\n");
}

#[test]
fn test_read_and_overwrite_at_position() {
    let (_temp, path) = setup_temp_table();
    let mut column = ColumnFile::create(&path, descriptor("name", 6)).unwrap();
    column.append_record(key(1), &field("John", 6)).unwrap();
    let position = column.append_record(key(2), &field("Ann", 6)).unwrap();

    assert_eq!(column.read_value_at(position).unwrap(), Value::scalar("Ann"));

    column.overwrite_value_at(position, &field("Bob", 6)).unwrap();

    assert_eq!(column.read_value_at(position).unwrap(), Value::scalar("Bob"));
    let bytes = fs::read(path.join("name.col")).unwrap();
    assert_eq!(bytes, b"00000001|John__\r\n00000002|Bob___\r\n");
}

#[test]
fn test_positions_outside_records_rejected() {
    let (_temp, path) = setup_temp_table();
    let mut column = ColumnFile::create(&path, descriptor("name", 6)).unwrap();
    let position = column.append_record(key(1), &field("John", 6)).unwrap();

    assert!(column.check_value_position(position).is_ok());

    // Key bytes, mid-field, and the value of a record that does not exist
    for bad in [0, position + 1, position + 17] {
        let err = column.check_value_position(bad).unwrap_err();
        assert!(matches!(err, CoreError::StalePosition { offset, .. } if offset == bad));
    }

    let err = column.overwrite_value_at(position + 17, &field("Bob", 6)).unwrap_err();
    assert!(matches!(err, CoreError::StalePosition { .. }));
    assert!(matches!(
        column.read_value_at(position + 17),
        Err(CoreError::StalePosition { .. })
    ));

    let bytes = fs::read(path.join("name.col")).unwrap();
    assert_eq!(bytes, b"00000001|John__\r\n");
}

#[test]
fn test_raw_primitives() {
    let (_temp, path) = setup_temp_table();
    let mut column = ColumnFile::create(&path, descriptor("name", 4)).unwrap();
    column.append_record(key(3), &field("ab", 4)).unwrap();

    column.rewind().unwrap();
    assert_eq!(column.offset().unwrap(), 0);
    assert_eq!(column.read_bytes(8).unwrap(), b"00000003");
    assert_eq!(column.seek_relative(1).unwrap(), 9);
    assert_eq!(column.read_bytes(4).unwrap(), b"ab__");
    assert_eq!(column.seek_to(13).unwrap(), 13);
    assert_eq!(column.read_bytes(2).unwrap(), b"\r\n");
}

#[test]
fn test_records_scan() {
    let (_temp, path) = setup_temp_table();
    let mut column = ColumnFile::create(&path, descriptor("name", 5)).unwrap();
    column.append_record(key(1), &field("John", 5)).unwrap();
    column.append_record(key(5), &field("Ann", 5)).unwrap();

    let records: Vec<_> = column.records().unwrap().map(|r| r.unwrap()).collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, Some(key(1)));
    assert_eq!(records[0].text(), "John");
    assert_eq!(records[1].offset, 16);
    assert_eq!(records[1].value_position(), 25);
    assert_eq!(records[1].text(), "Ann");
    assert_eq!(column.max_key().unwrap(), Some(key(5)));
}

#[test]
fn test_blank_key_scans_as_none() {
    let (_temp, path) = setup_temp_table();
    fs::write(path.join("name.col"), b"        |ab\r\n").unwrap();
    let mut column = ColumnFile::open(&path, descriptor("name", 2)).unwrap();

    let records: Vec<_> = column.records().unwrap().map(|r| r.unwrap()).collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, None);
}

#[test]
fn test_open_rejects_torn_file() {
    let (_temp, path) = setup_temp_table();
    fs::write(path.join("name.col"), b"00000001|John__\r\n000000").unwrap();

    let err = ColumnFile::open(&path, descriptor("name", 6)).unwrap_err();

    assert!(matches!(err, CoreError::Corrupt(_)));
}

#[test]
fn test_scan_reports_torn_tail() {
    let (_temp, path) = setup_temp_table();
    let mut column = ColumnFile::create(&path, descriptor("name", 6)).unwrap();
    column.append_record(key(1), &field("John", 6)).unwrap();

    // Tail written behind the handle's back
    let mut raw = OpenOptions::new().append(true).open(path.join("name.col")).unwrap();
    raw.write_all(b"0000").unwrap();

    let results: Vec<_> = column.records().unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(CoreError::Corrupt(_))));
}

#[test]
fn test_scan_reports_malformed_record() {
    let (_temp, path) = setup_temp_table();
    fs::write(path.join("name.col"), b"00000001#ab\r\n").unwrap();
    let mut column = ColumnFile::open(&path, descriptor("name", 2)).unwrap();

    let first = column.records().unwrap().next().unwrap();

    assert!(matches!(first, Err(CoreError::Corrupt(_))));
}

// =============================================================================
// ColumnStore Tests
// =============================================================================

#[test]
fn test_store_opens_columns_in_schema_order() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("b", 5), ("a", 7)]);

    let store = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();

    let names: Vec<_> = store.columns().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(store.index_of("a"), Some(1));
    assert_eq!(store.index_of("zzz"), None);
}

#[test]
fn test_store_missing_column_file() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 5)]);
    fs::remove_file(path.join("a.col")).unwrap();

    let err = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap_err();

    assert!(matches!(err, CoreError::SchemaMismatch(_)));
}

#[test]
fn test_store_stray_column_file() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 5)]);
    fs::write(path.join("ghost.col"), b"").unwrap();

    let err = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap_err();

    assert!(matches!(err, CoreError::SchemaMismatch(msg) if msg.contains("ghost")));
}

#[test]
fn test_store_ignores_unrelated_files() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 5)]);
    fs::write(path.join("notes.txt"), b"hello").unwrap();

    let store = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();

    assert_eq!(store.len(), 1);
}

#[test]
fn test_store_max_key_across_columns() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 3), ("b", 3)]);
    let mut store = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();

    assert_eq!(store.max_key().unwrap(), None);

    store.get_mut("a").unwrap().append_record(key(2), &field("x", 3)).unwrap();
    store.get_mut("b").unwrap().append_record(key(9), &field("y", 3)).unwrap();

    assert_eq!(store.max_key().unwrap(), Some(key(9)));
}

// =============================================================================
// Locking Tests
// =============================================================================

#[test]
fn test_lock_all_covers_every_column() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 3), ("b", 3), ("c", 3)]);
    let store = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();

    let lock = store.lock_all().unwrap();

    assert_eq!(lock.len(), 3);
}

#[test]
fn test_lock_contention_fails_after_one_retry() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 3), ("b", 3)]);
    let holder = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();
    let contender = ColumnStore::open(&path, &digest, Duration::from_millis(50)).unwrap();

    let _held = holder.lock_all().unwrap();

    let started = Instant::now();
    let err = contender.lock_all().unwrap_err();

    assert!(matches!(err, CoreError::LockFailed(p) if p.ends_with("a.col")));
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_lock_released_on_drop() {
    let (_temp, path) = setup_temp_table();
    let digest = create_table_with_columns(&path, &[("a", 3)]);
    let holder = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();
    let contender = ColumnStore::open(&path, &digest, Duration::from_millis(10)).unwrap();

    {
        let _held = holder.lock_all().unwrap();
        assert!(contender.lock_all().is_err());
    }

    assert!(contender.lock_all().is_ok());
}
