//! Single-instance run lock
//!
//! At most one sync process may run against a deployment at a time. The lock
//! is a non-blocking advisory `flock` on a file in the data directory: an
//! overlapping scheduler tick simply finds the lock held and exits cleanly.
//! Dropping the guard releases the lock on every exit path.

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use nix::fcntl::{flock, FlockArg};

use crate::error::{Result, StorageError};

/// Guard for the process-exclusivity lock. Held for the duration of a run.
pub struct RunLock {
    file: File,
}

impl RunLock {
    /// Try to acquire the lock without blocking.
    ///
    /// Returns `Ok(None)` when another process already holds it; that is
    /// expected contention, not an error.
    pub fn acquire(path: &Path) -> Result<Option<RunLock>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(StorageError::Io)?;

        match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => Ok(Some(RunLock { file })),
            Err(nix::errno::Errno::EWOULDBLOCK) => Ok(None),
            Err(e) => Err(StorageError::Lock(e.to_string()).into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Closing the descriptor would release the lock anyway; unlock
        // explicitly so the release does not depend on process teardown.
        let _ = flock(self.file.as_raw_fd(), FlockArg::Unlock);
    }
}
