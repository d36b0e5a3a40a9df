//! Table Lock
//!
//! Exclusive advisory locks over a set of column files.
//! Uses OS-level file locking (`flock` on Unix, `LockFileEx` on Windows).

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use tracing::{debug, error, warn};

use crate::error::{CoreError, Result};

use super::ColumnFile;

/// Exclusive locks on column files, released on drop
///
/// Holds duplicated handles of the locked files: a duplicate shares the
/// open file description, and with it the lock.
#[derive(Debug)]
pub struct TableLock {
    held: Vec<(PathBuf, File)>,
}

impl TableLock {
    pub(super) fn empty() -> Self {
        Self { held: Vec::new() }
    }

    /// Lock one column file: try, sleep `retry_delay`, try once more
    pub(super) fn acquire(&mut self, column: &ColumnFile, retry_delay: Duration) -> Result<()> {
        let handle = column.handle()?;

        match handle.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => {
                warn!(
                    path = %column.path().display(),
                    delay_ms = retry_delay.as_millis() as u64,
                    "Column file is locked, retrying once"
                );
                thread::sleep(retry_delay);
                if let Err(e) = handle.try_lock_exclusive() {
                    error!(path = %column.path().display(), error = %e, "Failed to lock column file");
                    return Err(CoreError::LockFailed(column.path().to_path_buf()));
                }
            }
            Err(e) => {
                error!(path = %column.path().display(), error = %e, "Failed to lock column file");
                return Err(CoreError::LockFailed(column.path().to_path_buf()));
            }
        }

        self.held.push((column.path().to_path_buf(), handle));
        Ok(())
    }

    /// Number of files held
    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        for (path, file) in &self.held {
            if let Err(e) = FileExt::unlock(file) {
                error!(path = %path.display(), error = %e, "Failed to release column lock");
            }
        }
        if !self.held.is_empty() {
            debug!(files = self.held.len(), "Released table lock");
        }
    }
}

/// Whether a failed `try_lock` means someone else holds the lock
fn is_contended(e: &io::Error) -> bool {
    // EWOULDBLOCK/EAGAIN is 11 on Linux, 35 on macOS
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == Some(11)
        || e.raw_os_error() == Some(35)
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
