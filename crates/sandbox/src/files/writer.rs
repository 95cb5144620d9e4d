//! Atomic content replacement for existing files.
//!
//! A write goes to a uniquely named temporary file in the target's own
//! directory, is flushed, takes on the target's permission bits and is then
//! renamed over the target. Readers see either the old or the new content in
//! full. The temporary must live on the same filesystem as the target for the
//! rename to be atomic, hence the same directory.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::error::{FileError, FileResult};
use super::resolver::SandboxRoot;
use super::MAX_FILE_SIZE;

/// Attempts at picking an unused temporary name before giving up.
const TEMP_NAME_ATTEMPTS: usize = 8;

/// Replaces the contents of existing files inside a sandbox root.
#[derive(Debug, Clone)]
pub struct FileWriter {
    root: Arc<SandboxRoot>,
}

impl FileWriter {
    /// Create a writer bound to `root`.
    pub fn new(root: Arc<SandboxRoot>) -> Self {
        Self { root }
    }

    /// Atomically replace the contents of the existing file at `rel`.
    ///
    /// Never creates new files. The original permission bits are kept. On any
    /// failure before the final rename the original file is left untouched
    /// and the temporary file is removed.
    pub fn write(&self, rel: &str, data: &[u8]) -> FileResult<()> {
        let target = self.root.resolve(rel)?.into_path_buf();

        let metadata = fs::metadata(&target).map_err(|e| FileError::io("stat", &target, e))?;
        if metadata.is_dir() {
            return Err(FileError::IsDirectory(target));
        }
        if !metadata.is_file() {
            return Err(FileError::io(
                "write",
                &target,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let size = data.len() as u64;
        if size > MAX_FILE_SIZE {
            return Err(FileError::FileTooLarge {
                size,
                limit: MAX_FILE_SIZE,
            });
        }

        replace_via_temp(&target, data, metadata.permissions(), |from, to| {
            fs::rename(from, to)
        })?;

        debug!(path = rel, size, "Replaced file contents");
        Ok(())
    }
}

/// Stage `data` in a temporary beside `target`, then `commit` it into place.
///
/// The temporary is removed if any step up to and including `commit` fails.
fn replace_via_temp<F>(
    target: &Path,
    data: &[u8],
    permissions: fs::Permissions,
    commit: F,
) -> FileResult<()>
where
    F: FnOnce(&Path, &Path) -> io::Result<()>,
{
    let (mut file, guard) = create_temp_beside(target)?;

    file.write_all(data)
        .and_then(|()| file.sync_all())
        .map_err(|e| FileError::io("write", guard.path(), e))?;
    drop(file);

    fs::set_permissions(guard.path(), permissions)
        .map_err(|e| FileError::io("chmod", guard.path(), e))?;

    commit(guard.path(), target).map_err(|e| FileError::io("rename", target, e))?;
    guard.disarm();
    Ok(())
}

/// Create a fresh temporary file in the same directory as `target`.
fn create_temp_beside(target: &Path) -> FileResult<(fs::File, TempFileGuard)> {
    let dir = target.parent().ok_or_else(|| {
        FileError::io(
            "write",
            target,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory"),
        )
    })?;
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut last_err = None;
    for _ in 0..TEMP_NAME_ATTEMPTS {
        let temp_path = dir.join(format!(".{}.{:016x}.tmp", name, rand::random::<u64>()));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, TempFileGuard::new(temp_path))),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
            Err(e) => return Err(FileError::io("create", &temp_path, e)),
        }
    }

    Err(FileError::io(
        "create",
        dir,
        last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::AlreadyExists)),
    ))
}

/// Removes a temporary file on drop unless disarmed.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed away; nothing left to clean up.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = ?self.path, error = %e, "Failed to cleanup temp file after failed write");
        }
    }
}
