//! Path resolution against a fixed sandbox root.
//!
//! Every untrusted relative path goes through [`SandboxRoot::resolve`] before
//! any other component touches the filesystem. Resolution is done against the
//! real, current filesystem (symlinks included) and the result is accepted
//! only if it is the root itself or lies underneath it.
//!
//! # Time of check / time of use
//!
//! The returned [`ResolvedPath`] is a path string, not a handle. Between
//! resolution and the caller's subsequent open/stat/rename the tree may change
//! (for example a directory swapped for a symlink). This gap is accepted as a
//! documented limitation.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::warn;

use super::error::{FileError, FileResult};

/// A canonicalized directory that all relative paths are resolved against.
///
/// Fixed at construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRoot {
    root: PathBuf,
}

/// An absolute, canonical path that was inside the sandbox when resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    /// Borrow the underlying path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Take ownership of the underlying path.
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl SandboxRoot {
    /// Canonicalize `root` and use it as the sandbox boundary.
    ///
    /// Fails with [`FileError::RootResolution`] if the root does not exist or
    /// cannot be resolved. This is a configuration error, not a per-request one.
    pub fn new(root: impl AsRef<Path>) -> FileResult<Self> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|source| FileError::RootResolution {
            root: root.to_path_buf(),
            source,
        })?;

        Ok(Self { root: canonical })
    }

    /// The canonical root path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve an untrusted relative path to a canonical path inside the root.
    ///
    /// An empty string is treated as `.`.
    pub fn resolve(&self, rel: &str) -> FileResult<ResolvedPath> {
        let normalized = normalize(rel).inspect_err(|e| {
            warn!(path = rel, error = %e, "Rejected path");
        })?;

        let joined = self.root.join(&normalized);
        let canonical =
            fs::canonicalize(&joined).map_err(|e| FileError::io("resolve", &joined, e))?;

        if !self.contains(&canonical) {
            warn!(path = rel, resolved = ?canonical, "Path escapes sandbox root");
            return Err(FileError::PathOutsideRoot(rel.to_string()));
        }

        Ok(ResolvedPath(canonical))
    }

    /// Whether `path` equals the root or lies beneath it.
    ///
    /// `Path::starts_with` compares whole components, so `/root-other` is not
    /// considered inside `/root`.
    pub fn contains(&self, path: &Path) -> bool {
        path == self.root || path.starts_with(&self.root)
    }
}

/// Resolve `rel` against `root` in one step.
///
/// Canonicalizes `root` on every call; long-lived callers should build a
/// [`SandboxRoot`] once instead.
pub fn resolve(root: impl AsRef<Path>, rel: &str) -> FileResult<ResolvedPath> {
    SandboxRoot::new(root)?.resolve(rel)
}

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// Absolute paths are rejected outright, and a `..` that would climb above
/// the starting point is rejected as an escape.
fn normalize(rel: &str) -> FileResult<PathBuf> {
    let path = Path::new(rel);
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(FileError::AbsolutePathNotAllowed(rel.to_string()));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(FileError::PathOutsideRoot(rel.to_string()));
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }

    Ok(normalized)
}
