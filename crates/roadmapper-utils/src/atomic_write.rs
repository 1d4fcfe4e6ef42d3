//! Atomic document writes: temp file, fsync, rename.
//!
//! Roadmap checkpoints must never leave a half-written document behind, so
//! every store write goes through [`write_file_atomic`]. A crash before the
//! rename leaves the previous checkpoint intact.

use camino::Utf8Path;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

#[cfg(target_os = "windows")]
use std::{thread, time::Duration};

/// Result of an atomic write operation
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of rename retries that occurred (Windows only)
    pub rename_retry_count: u32,
    /// Whether cross-filesystem fallback was used
    pub used_cross_filesystem_fallback: bool,
}

/// Atomically write `content` to `path`.
///
/// Creates missing parent directories. Content is written to a temp file in
/// the target directory, fsynced, then renamed over the target.
///
/// # Errors
///
/// Returns the underlying I/O error if any step fails.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> io::Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();

    let temp_dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(temp_dir)?;

    let mut temp_file = NamedTempFile::new_in(temp_dir)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;

    let temp_path = temp_file.path().to_path_buf();

    match atomic_rename(temp_file, path.as_std_path()) {
        Ok(retry_count) => result.rename_retry_count = retry_count,
        Err(e) if is_cross_filesystem_error(&e) => {
            result.used_cross_filesystem_fallback = true;
            cross_filesystem_copy_from_path(&temp_path, path)?;
        }
        Err(e) => return Err(e),
    }

    Ok(result)
}

/// Attempt atomic rename with bounded retries for transient sharing violations.
#[cfg(target_os = "windows")]
fn atomic_rename(mut temp_file: NamedTempFile, target: &Path) -> io::Result<u32> {
    const MAX_RETRIES: u32 = 5;
    const INITIAL_DELAY_MS: u64 = 10;

    let mut retry_count = 0;
    loop {
        match temp_file.persist(target) {
            Ok(_) => return Ok(retry_count),
            Err(persist_error) => {
                let retryable = matches!(
                    persist_error.error.kind(),
                    io::ErrorKind::PermissionDenied | io::ErrorKind::Other
                );
                if retry_count >= MAX_RETRIES || !retryable {
                    return Err(persist_error.error);
                }
                thread::sleep(Duration::from_millis(INITIAL_DELAY_MS * 2_u64.pow(retry_count)));
                retry_count += 1;
                temp_file = persist_error.file;
            }
        }
    }
}

/// Attempt atomic rename (Unix: no retry needed)
#[cfg(not(target_os = "windows"))]
fn atomic_rename(temp_file: NamedTempFile, target: &Path) -> io::Result<u32> {
    temp_file.persist(target).map(|_| 0).map_err(|e| e.error)
}

#[cfg(unix)]
fn is_cross_filesystem_error(err: &io::Error) -> bool {
    // EXDEV on Linux/macOS
    err.raw_os_error() == Some(18)
}

#[cfg(not(unix))]
fn is_cross_filesystem_error(_err: &io::Error) -> bool {
    false
}

fn cross_filesystem_copy_from_path(temp_path: &Path, target: &Utf8Path) -> io::Result<()> {
    let content = fs::read(temp_path)?;

    let target_dir = target.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut target_temp = NamedTempFile::new_in(target_dir)?;
    target_temp.write_all(&content)?;
    target_temp.as_file().sync_all()?;
    target_temp
        .persist(target.as_std_path())
        .map_err(|e| e.error)?;

    let _ = fs::remove_file(temp_path);
    Ok(())
}
