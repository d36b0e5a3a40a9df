//! Storage Module
//!
//! File layer of a table: one fixed-width file per column.
//!
//! ## Responsibilities
//! - Open one read/write handle per digest column
//! - Raw seek/read/write primitives and record scans
//! - Table-wide exclusive locking with a single bounded retry
//!
//! ## Table Directory
//! ```text
//! {table}/
//! ├── digest.json        column descriptors
//! ├── digest.seq         last issued key
//! ├── firstName.col      KKKKKKKK|VVVV…VVVV\r\n  (repeated)
//! └── surname.col
//! ```

mod column;
mod lock;
mod store;

pub use column::{ColumnFile, RecordScan, ScannedRecord};
pub use lock::TableLock;
pub use store::ColumnStore;
