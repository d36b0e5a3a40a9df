//! Tests for Digest and Sequence
//!
//! These tests verify:
//! - Creating and loading a digest
//! - Load-time failures (missing table, missing digest, bad JSON)
//! - Column descriptors: clamping, duplicates, persistence
//! - The key sequence file

use std::fs;
use std::path::PathBuf;

use coltab::codec::Key;
use coltab::schema::{ColumnDescriptor, Digest, Sequence};
use coltab::CoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_table() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("people");
    fs::create_dir(&path).unwrap();
    (temp_dir, path)
}

// =============================================================================
// Create/Load Tests
// =============================================================================

#[test]
fn test_create_writes_empty_array() {
    let (_temp, path) = setup_temp_table();

    let digest = Digest::create(&path).unwrap();

    assert!(digest.columns().is_empty());
    let text = fs::read_to_string(path.join(Digest::FILENAME)).unwrap();
    assert_eq!(text.trim(), "[]");
}

#[test]
fn test_create_twice_fails() {
    let (_temp, path) = setup_temp_table();

    Digest::create(&path).unwrap();
    let err = Digest::create(&path).unwrap_err();

    assert!(matches!(err, CoreError::TableAlreadyExists(_)));
}

#[test]
fn test_load_missing_table() {
    let temp_dir = TempDir::new().unwrap();
    let err = Digest::load(&temp_dir.path().join("nope")).unwrap_err();

    assert!(matches!(err, CoreError::TableNotFound(_)));
}

#[test]
fn test_load_missing_digest() {
    let (_temp, path) = setup_temp_table();

    let err = Digest::load(&path).unwrap_err();

    assert!(matches!(err, CoreError::DigestMissing(_)));
}

#[cfg(unix)]
#[test]
fn test_load_read_only_table() {
    use std::os::unix::fs::PermissionsExt;

    let (_temp, path) = setup_temp_table();
    Digest::create(&path).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o555)).unwrap();

    let result = Digest::load(&path);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(CoreError::TableNotWritable(p)) if p == path));
}

#[test]
fn test_load_malformed_digest() {
    let (_temp, path) = setup_temp_table();
    fs::write(path.join(Digest::FILENAME), "{not json").unwrap();

    let err = Digest::load(&path).unwrap_err();

    assert!(matches!(err, CoreError::Serialization(_)));
}

#[test]
fn test_load_rejects_out_of_range_capacity() {
    let (_temp, path) = setup_temp_table();
    fs::write(
        path.join(Digest::FILENAME),
        r#"[{"name": "big", "capacity": 500}]"#,
    )
    .unwrap();

    let err = Digest::load(&path).unwrap_err();

    assert!(matches!(err, CoreError::Corrupt(_)));
}

#[test]
fn test_load_rejects_duplicate_names() {
    let (_temp, path) = setup_temp_table();
    fs::write(
        path.join(Digest::FILENAME),
        r#"[{"name": "a", "capacity": 5}, {"name": "a", "capacity": 6}]"#,
    )
    .unwrap();

    let err = Digest::load(&path).unwrap_err();

    assert!(matches!(err, CoreError::Corrupt(_)));
}

// =============================================================================
// Column Descriptor Tests
// =============================================================================

#[test]
fn test_add_column_persists_in_order() {
    let (_temp, path) = setup_temp_table();

    {
        let mut digest = Digest::create(&path).unwrap();
        digest.add_column("firstName", 20).unwrap();
        digest.add_column("surname", 30).unwrap();
    }

    let digest = Digest::load(&path).unwrap();
    assert_eq!(
        digest.columns(),
        &[
            ColumnDescriptor {
                name: "firstName".to_string(),
                capacity: 20
            },
            ColumnDescriptor {
                name: "surname".to_string(),
                capacity: 30
            },
        ]
    );
}

#[test]
fn test_digest_is_pretty_json_array() {
    let (_temp, path) = setup_temp_table();

    let mut digest = Digest::create(&path).unwrap();
    digest.add_column("firstName", 20).unwrap();

    let text = fs::read_to_string(path.join(Digest::FILENAME)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!([{ "name": "firstName", "capacity": 20 }])
    );
    assert!(text.contains('\n'));
}

#[test]
fn test_add_column_clamps_capacity() {
    let (_temp, path) = setup_temp_table();
    let mut digest = Digest::create(&path).unwrap();

    assert_eq!(digest.add_column("tiny", 0).unwrap().capacity, 1);
    assert_eq!(digest.add_column("huge", 1000).unwrap().capacity, 100);
    assert_eq!(digest.add_column("normal", 42).unwrap().capacity, 42);
}

#[test]
fn test_add_duplicate_column_fails() {
    let (_temp, path) = setup_temp_table();
    let mut digest = Digest::create(&path).unwrap();

    digest.add_column("email", 40).unwrap();
    let err = digest.add_column("email", 10).unwrap_err();

    assert!(matches!(err, CoreError::ColumnAlreadyExists(name) if name == "email"));
    assert_eq!(digest.columns().len(), 1);
}

#[test]
fn test_column_lookup() {
    let (_temp, path) = setup_temp_table();
    let mut digest = Digest::create(&path).unwrap();
    digest.add_column("email", 40).unwrap();

    assert_eq!(digest.column("email").map(|c| c.capacity), Some(40));
    assert!(digest.column("phone").is_none());
}

// =============================================================================
// Sequence Tests
// =============================================================================

#[test]
fn test_sequence_missing_file_is_none() {
    let (_temp, path) = setup_temp_table();

    assert_eq!(Sequence::new(&path).last().unwrap(), None);
}

#[test]
fn test_sequence_store_and_read() {
    let (_temp, path) = setup_temp_table();
    let sequence = Sequence::new(&path);

    sequence.store(Key::new(41).unwrap()).unwrap();

    assert_eq!(sequence.last().unwrap(), Key::new(41));
    assert_eq!(fs::read_to_string(sequence.path()).unwrap(), "41");
}

#[test]
fn test_sequence_garbage_is_corrupt() {
    let (_temp, path) = setup_temp_table();
    fs::write(path.join(Sequence::FILENAME), "forty-one").unwrap();

    let err = Sequence::new(&path).last().unwrap_err();

    assert!(matches!(err, CoreError::Corrupt(_)));
}
