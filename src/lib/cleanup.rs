//! Removal of directory trees which may be briefly locked by other processes.
//!
//! On some platforms a directory stays locked for a moment after a clone or an extraction,
//! e.g. while a virus scanner inspects it. [`remove_tree`] retries those failures a few times
//! with a linearly growing delay and gives up on anything else immediately.

use std::io;
use std::path::Path;
use std::time::Duration;

use crate::error::Error;

/// How often, and how patiently, to retry a failed removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// The delay after the first failed attempt. Attempt `n` waits `n * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

#[cfg(windows)]
const ERROR_ACCESS_DENIED: i32 = 5;
#[cfg(windows)]
const ERROR_SHARING_VIOLATION: i32 = 32;
#[cfg(windows)]
const ERROR_LOCK_VIOLATION: i32 = 33;

/// Whether a removal failure is worth retrying: the target is busy, or the OS refused the
/// operation. Every other failure is final.
pub fn is_transient(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::ResourceBusy | io::ErrorKind::PermissionDenied
    ) {
        return true;
    }
    #[cfg(windows)]
    if matches!(
        err.raw_os_error(),
        Some(ERROR_ACCESS_DENIED | ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
    ) {
        return true;
    }
    false
}

fn remove_once(path: &Path) -> io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn remove_with<F>(path: &Path, policy: RetryPolicy, mut remove: F) -> Result<(), Error>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match remove(path) {
            Ok(()) => return Ok(()),
            Err(err) if is_transient(&err) && attempt < attempts => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "removing {} failed ({err}), retrying in {delay:?} [{attempt}/{attempts}]",
                    path.display()
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(source) => {
                return Err(Error::CleanupFailed {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Recursively delete `path` with the default [`RetryPolicy`]. A missing path is not an error.
pub fn remove_tree<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    remove_tree_with(path, RetryPolicy::default())
}

/// Recursively delete `path`, retrying transient failures according to `policy`.
pub fn remove_tree_with<P: AsRef<Path>>(path: P, policy: RetryPolicy) -> Result<(), Error> {
    let path = path.as_ref();
    log::debug!("removing {}", path.display());
    remove_with(path, policy, remove_once)
}
