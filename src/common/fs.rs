use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::ProfileError;

/// Windows `ERROR_SHARING_VIOLATION` / `ERROR_LOCK_VIOLATION`: the file is open in another program.
const SHARING_VIOLATION: i32 = 32;
const LOCK_VIOLATION: i32 = 33;

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub(crate) fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("Path exists but is not a directory: {}", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Error with `ProfileError::MissingFile` unless something exists at `path`.
pub(crate) fn require_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ProfileError::MissingFile(path.to_path_buf()).into());
    }
    Ok(())
}

/// True for errors raised when another program holds the file open.
fn is_locked(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || matches!(err.raw_os_error(), Some(SHARING_VIOLATION | LOCK_VIOLATION))
}

/// Read `path` with `read`; if the file is locked, read a temporary copy instead.
/// The copy is removed when it goes out of scope, and a failed removal is ignored.
pub(crate) fn read_with_copy_fallback<T>(path: &Path, read: impl Fn(&Path) -> io::Result<T>) -> Result<T> {
    match read(path) {
        Ok(value) => Ok(value),
        Err(err) if is_locked(&err) => {
            warn!("permission denied for {}; file might be open, reading a temporary copy", path.display());

            let suffix = path.extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default();
            let copy = tempfile::Builder::new()
                .prefix("temp_copy_")
                .suffix(&suffix)
                .tempfile()
                .context("Failed to create temporary copy")?;

            fs::copy(path, copy.path())
                .with_context(|| format!("Failed to copy locked file {}", path.display()))?;
            debug!("copied to temporary file: {}", copy.path().display());

            read(copy.path())
                .with_context(|| format!("Failed to read temporary copy of {}", path.display()))
        }
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Write-then-rename wrapper for outputs that must never be left half-written.
pub(crate) struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl PendingWrite {
    /// Path of the temporary file to write into.
    pub(crate) fn path(&self) -> &Path { self.tmp.path() }
}

/// Reserve a temporary file next to `target`, creating parent directories as needed.
pub(crate) fn open_for_atomic_write(target: &Path) -> Result<PendingWrite> {
    let parent = target.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("create dir {}", parent.display()))?;

    let tmp = NamedTempFile::new_in(parent)
        .context("create temp file")?;

    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

/// Move the finished temporary file over the target, replacing any prior file.
pub(crate) fn finalize_atomic_write(pending: PendingWrite) -> Result<()> {
    pending.tmp.as_file().sync_all().ok(); // best-effort fsync file
    pending.tmp.persist(&pending.target)
        .with_context(|| format!("rename to {}", pending.target.display()))?;
    if let Some(dir) = pending.target.parent() {
        let _ = File::open(dir).and_then(|f| f.sync_all());
    }
    Ok(())
}
