//! Error types for coltab
//!
//! Provides a unified error type for all table operations. The engine always
//! returns these as values; whether a failure halts the caller or is swallowed
//! is decided by the `report` layer.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Unified error type for coltab operations
#[derive(Debug, Error)]
pub enum CoreError {
    // -------------------------------------------------------------------------
    // Table / Schema Errors
    // -------------------------------------------------------------------------
    #[error("Table not found: {}", .0.display())]
    TableNotFound(PathBuf),

    #[error("Table already exists: {}", .0.display())]
    TableAlreadyExists(PathBuf),

    #[error("Table directory is not writable: {}", .0.display())]
    TableNotWritable(PathBuf),

    #[error("Digest file missing: {}", .0.display())]
    DigestMissing(PathBuf),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column already exists: {0}")]
    ColumnAlreadyExists(String),

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Reserved character in input: {0:?}")]
    ReservedCharacter(String),

    #[error("Unsafe input rejected: {0:?}")]
    UnsafeInput(String),

    #[error("Insert carries no values")]
    EmptyRecord,

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record not found")]
    RecordNotFound,

    #[error("Value in column {column} for key {key} is not a list")]
    NotAList { column: String, key: String },

    #[error("Item {item:?} not found in column {column} for key {key}")]
    ItemNotFound {
        column: String,
        key: String,
        item: String,
    },

    #[error("Value of {len} bytes exceeds capacity {capacity} of column {column}")]
    CapacityExceeded {
        column: String,
        capacity: usize,
        len: usize,
    },

    #[error("Key limit exceeded: table is full")]
    KeyLimitExceeded,

    #[error("Cursor was produced by another table: {}", .0.display())]
    ForeignCursor(PathBuf),

    #[error("Cursor position {offset} is not a value field of column {column}")]
    StalePosition { column: String, offset: u64 },

    // -------------------------------------------------------------------------
    // Locking / Write Errors
    // -------------------------------------------------------------------------
    #[error("Failed to lock column file: {}", .0.display())]
    LockFailed(PathBuf),

    #[error("Write failed on column {column}: {source}")]
    WriteFailed {
        column: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt table data: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::TableNotFound(_) => "TableNotFound",
            CoreError::TableAlreadyExists(_) => "TableAlreadyExists",
            CoreError::TableNotWritable(_) => "TableNotWritable",
            CoreError::DigestMissing(_) => "DigestMissing",
            CoreError::SchemaMismatch(_) => "SchemaMismatch",
            CoreError::ColumnNotFound(_) => "ColumnNotFound",
            CoreError::ColumnAlreadyExists(_) => "ColumnAlreadyExists",
            CoreError::ReservedCharacter(_) => "ReservedCharacter",
            CoreError::UnsafeInput(_) => "UnsafeInput",
            CoreError::EmptyRecord => "EmptyRecord",
            CoreError::RecordNotFound => "RecordNotFound",
            CoreError::NotAList { .. } => "NotAList",
            CoreError::ItemNotFound { .. } => "ItemNotFound",
            CoreError::CapacityExceeded { .. } => "CapacityExceeded",
            CoreError::KeyLimitExceeded => "KeyLimitExceeded",
            CoreError::ForeignCursor(_) => "ForeignCursor",
            CoreError::StalePosition { .. } => "StalePosition",
            CoreError::LockFailed(_) => "LockFailed",
            CoreError::WriteFailed { .. } => "WriteFailed",
            CoreError::Corrupt(_) => "Corrupt",
            CoreError::Io(_) => "Io",
            CoreError::Serialization(_) => "Serialization",
        }
    }
}
