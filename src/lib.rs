//! # coltab
//!
//! An embedded, file-backed tabular store:
//! - A table is a directory of fixed-width column files plus a digest
//! - A record is every value sharing one 8-digit key across column files
//! - Linear-scan search with substring/whole and case modes
//! - Insert, overwrite-or-append, list-append and list-remove writes,
//!   validated in full before any byte is committed
//! - Table-wide exclusive file locks for cross-process writers
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Table                               │
//! │        (guard → lock → validate all → commit all)            │
//! └──────────┬──────────────────┬───────────────────┬───────────┘
//!            │                  │                   │
//!            ▼                  ▼                   ▼
//!   ┌─────────────┐    ┌────────────────┐   ┌──────────────┐
//!   │   Digest    │    │     Search     │   │    Codec     │
//!   │ + Sequence  │    │ scan → resolve │   │ fixed-width  │
//!   └─────────────┘    │   → assemble   │   │   fields     │
//!                      └───────┬────────┘   └──────────────┘
//!                              │
//!                              ▼
//!                      ┌────────────────┐
//!                      │  ColumnStore   │
//!                      │ (column files, │
//!                      │  table lock)   │
//!                      └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod report;

pub mod codec;
pub mod guard;
pub mod schema;
pub mod storage;
pub mod search;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::{Key, Value};
pub use config::Config;
pub use engine::Table;
pub use error::{CoreError, Result};
pub use report::{ErrorMode, ErrorReport, Outcome};
pub use search::{Cursor, Record, SearchQuery};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of coltab
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
