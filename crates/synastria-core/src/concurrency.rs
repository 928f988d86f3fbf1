use crate::LaunchError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// Exclusive advisory lock serializing work on one prefix.
///
/// The lock file sits next to the prefix (`.<leaf>.lock`) so the prefix
/// itself only ever contains what the compatibility layer puts there.
pub struct PrefixLock {
    lock_file: File,
}

impl PrefixLock {
    pub fn lock_path_for(prefix: &Path) -> PathBuf {
        match (prefix.parent(), prefix.file_name()) {
            (Some(parent), Some(leaf)) => parent.join(format!(".{}.lock", leaf.to_string_lossy())),
            _ => prefix.join(".synastria.lock"),
        }
    }

    /// Block until the prefix is free.
    pub fn acquire(prefix: &Path) -> Result<Self, LaunchError> {
        let (file, lock_path) = open_lock_file(prefix)?;

        if file.try_lock_exclusive().is_err() {
            info!("prefix {} is busy, waiting for it", prefix.display());
            file.lock_exclusive()
                .map_err(|source| LaunchError::PrefixLockFailed {
                    path: lock_path.display().to_string(),
                    source,
                })?;
        }

        Ok(Self { lock_file: file })
    }

    /// Take the lock only if nobody holds it.
    pub fn try_acquire(prefix: &Path) -> Result<Option<Self>, LaunchError> {
        let (file, _) = open_lock_file(prefix)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { lock_file: file })),
            Err(_) => Ok(None),
        }
    }
}

fn open_lock_file(prefix: &Path) -> Result<(File, PathBuf), LaunchError> {
    let lock_path = PrefixLock::lock_path_for(prefix);
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LaunchError::PrefixCreationFailed {
            path: prefix.display().to_string(),
            source,
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|source| LaunchError::PrefixLockFailed {
            path: lock_path.display().to_string(),
            source,
        })?;
    Ok((file, lock_path))
}

impl Drop for PrefixLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}
