//! Exclusive worker lock on a store directory.
//!
//! The lock is advisory: it coordinates roadmapper processes and is not a
//! security boundary. It is held for as long as the [`StoreLock`] lives and
//! released by the OS when the file handle closes, including on crash.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use tracing::debug;

use roadmapper_utils::error::StoreError;

const LOCK_FILE_NAME: &str = ".worker.lock";

/// Written into the lock file for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
    pub version: String,
}

pub struct StoreLock {
    path: Utf8PathBuf,
    // Keeps the descriptor (and with it the OS lock) alive
    _lock: RwLock<File>,
    info: LockInfo,
}

impl StoreLock {
    /// Try to take the worker lock for `store_dir` without blocking.
    ///
    /// # Errors
    ///
    /// `StoreError::Locked` when another worker holds it, `StoreError::Io`
    /// when the lock file cannot be opened or written.
    pub fn acquire(store_dir: &Utf8Path) -> Result<Self, StoreError> {
        fs::create_dir_all(store_dir).map_err(|e| StoreError::io(store_dir, e))?;
        let path = store_dir.join(LOCK_FILE_NAME);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let info = LockInfo {
            pid: std::process::id(),
            acquired_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let json = serde_json::to_string_pretty(&info).map_err(|e| StoreError::Serialize {
            id: LOCK_FILE_NAME.to_string(),
            reason: e.to_string(),
        })?;

        let mut lock = RwLock::new(file);
        {
            let mut guard = lock.try_write().map_err(|_| StoreError::Locked {
                path: store_dir.into(),
            })?;

            let file: &mut File = &mut guard;
            file.set_len(0).map_err(|e| StoreError::io(&path, e))?;
            file.seek(SeekFrom::Start(0))
                .map_err(|e| StoreError::io(&path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| StoreError::io(&path, e))?;
            file.flush().map_err(|e| StoreError::io(&path, e))?;

            // Leave the OS lock in place; it is released when `lock` closes
            // the descriptor on drop.
            std::mem::forget(guard);
        }

        debug!(path = %path, pid = info.pid, "Acquired store lock");
        Ok(Self {
            path,
            _lock: lock,
            info,
        })
    }

    /// Read the holder information left in a store's lock file, if any.
    pub fn holder(store_dir: &Utf8Path) -> Result<Option<LockInfo>, StoreError> {
        let path = store_dir.join(LOCK_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    path: path.into(),
                    reason: e.to_string(),
                }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    #[must_use]
    pub fn info(&self) -> &LockInfo {
        &self.info
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock")
            .field("path", &self.path)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let temp = TempDir::new().unwrap();
        let store_dir = dir(&temp);

        let first = StoreLock::acquire(&store_dir).unwrap();
        assert_eq!(first.info().pid, std::process::id());

        let second = StoreLock::acquire(&store_dir);
        assert!(matches!(second, Err(StoreError::Locked { .. })));

        drop(first);
        assert!(StoreLock::acquire(&store_dir).is_ok());
    }

    #[test]
    fn test_holder_reports_lock_info() {
        let temp = TempDir::new().unwrap();
        let store_dir = dir(&temp);
        assert_eq!(StoreLock::holder(&store_dir).unwrap(), None);

        let lock = StoreLock::acquire(&store_dir).unwrap();
        let holder = StoreLock::holder(&store_dir).unwrap().unwrap();
        assert_eq!(&holder, lock.info());
        assert!(lock.path().ends_with(LOCK_FILE_NAME));
    }
}
