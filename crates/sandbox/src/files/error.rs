//! Error types for sandboxed file access.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the file-access operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// The sandbox root itself could not be canonicalized.
    #[error("failed to resolve sandbox root {root}: {source}")]
    RootResolution {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The caller supplied an absolute path.
    #[error("absolute paths are not allowed: {0}")]
    AbsolutePathNotAllowed(String),

    /// The path resolves to a location outside the sandbox root.
    #[error("path is outside the sandbox root: {0}")]
    PathOutsideRoot(String),

    /// A listing was requested for something that is not a directory.
    #[error("path is not a directory: {0}")]
    NotDirectory(PathBuf),

    /// A write was requested for a directory.
    #[error("path is a directory: {0}")]
    IsDirectory(PathBuf),

    /// The payload exceeds the size cap.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// An OS-level failure, tagged with the operation that hit it.
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Stable tag for each failure kind, for mapping onto transport responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    RootResolution,
    AbsolutePathNotAllowed,
    PathOutsideRoot,
    NotDirectory,
    IsDirectory,
    FileTooLarge,
    NotFound,
    PermissionDenied,
    Io,
}

impl FileError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns the failure kind, splitting common OS errors out of `Io`.
    pub fn kind(&self) -> FileErrorKind {
        match self {
            Self::RootResolution { .. } => FileErrorKind::RootResolution,
            Self::AbsolutePathNotAllowed(_) => FileErrorKind::AbsolutePathNotAllowed,
            Self::PathOutsideRoot(_) => FileErrorKind::PathOutsideRoot,
            Self::NotDirectory(_) => FileErrorKind::NotDirectory,
            Self::IsDirectory(_) => FileErrorKind::IsDirectory,
            Self::FileTooLarge { .. } => FileErrorKind::FileTooLarge,
            Self::Io { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => FileErrorKind::NotFound,
                io::ErrorKind::PermissionDenied => FileErrorKind::PermissionDenied,
                _ => FileErrorKind::Io,
            },
        }
    }

    /// Whether the error wraps an OS "not found".
    pub fn is_not_found(&self) -> bool {
        self.kind() == FileErrorKind::NotFound
    }

    /// Whether the request was rejected for trying to leave the sandbox.
    pub fn is_security_rejection(&self) -> bool {
        matches!(
            self,
            Self::AbsolutePathNotAllowed(_) | Self::PathOutsideRoot(_)
        )
    }
}

/// Result alias for file-access operations.
pub type FileResult<T> = std::result::Result<T, FileError>;
