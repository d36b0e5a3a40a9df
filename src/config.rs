//! Configuration for coltab
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::report::ErrorMode;

// =============================================================================
// Format Limits
// =============================================================================

/// Smallest capacity a column may declare
pub const MIN_CAPACITY: usize = 1;

/// Largest capacity a column may declare
pub const MAX_CAPACITY: usize = 100;

/// Capacity used when a column is created without one
pub const DEFAULT_CAPACITY: usize = 50;

/// Search limits are clamped into `[MIN_LIMIT, MAX_LIMIT]`
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 100;

/// Highest key an insert may generate
pub const MAX_KEY: u32 = 99_999_999;

/// Main configuration for a table instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Table directory
    /// Internal structure:
    ///   {table_dir}/
    ///     ├── digest.json      (column descriptors)
    ///     ├── digest.seq       (last issued key)
    ///     └── {column}.col     (one fixed-width file per column)
    pub table_dir: PathBuf,

    /// fsync touched column files after every committed write
    pub sync_writes: bool,

    // -------------------------------------------------------------------------
    // Locking Configuration
    // -------------------------------------------------------------------------
    /// Pause between the first and the second (last) lock attempt
    pub lock_retry_delay: Duration,

    // -------------------------------------------------------------------------
    // Boundary Configuration
    // -------------------------------------------------------------------------
    /// How failures surface to the caller of the engine
    pub error_mode: ErrorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_dir: PathBuf::from("./coltab_data"),
            sync_writes: true,
            lock_retry_delay: Duration::from_secs(1),
            error_mode: ErrorMode::Report,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the table directory
    pub fn table_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.table_dir = path.into();
        self
    }

    /// Enable or disable fsync after writes
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the delay before the single lock retry
    pub fn lock_retry_delay(mut self, delay: Duration) -> Self {
        self.config.lock_retry_delay = delay;
        self
    }

    /// Set the boundary error mode
    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.config.error_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
