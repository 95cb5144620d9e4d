//! Sandboxed file access.
//!
//! This module provides the file operations used by the HTTP layer:
//! - Path resolution and containment checks against a fixed root
//! - Directory listing with a stable directories-first order
//! - Content sniffing and bounded text previews
//! - Raw byte streams for images and downloads
//! - Atomic in-place content replacement
//!
//! # Security
//!
//! Every operation resolves its path through [`SandboxRoot::resolve`] first.
//! Absolute paths are rejected, `..` may not climb above the root, and
//! symlinks are followed before the containment check so a link cannot point
//! the caller outside the sandbox.
//!
//! All operations are synchronous and hold no mutable state beyond the
//! immutable root, so a [`FileSystem`] can be shared across threads freely.

pub mod browser;
pub mod classify;
pub mod error;
pub mod raw;
pub mod reader;
pub mod resolver;
pub mod writer;

use std::path::Path;
use std::sync::Arc;

use protocol::{DirListing, FileContent};

pub use browser::{DirectoryLister, VCS_DIR_NAME};
pub use classify::{classify, coarsen, sniff_mime, SNIFF_LEN};
pub use error::{FileError, FileErrorKind, FileResult};
pub use raw::{RawFile, RawStreamer};
pub use reader::FileReader;
pub use resolver::{resolve, ResolvedPath, SandboxRoot};
pub use writer::FileWriter;

/// Cap on inline preview content and on write payloads (1 MiB).
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// All file operations bound to one sandbox root.
#[derive(Debug, Clone)]
pub struct FileSystem {
    root: Arc<SandboxRoot>,
    lister: DirectoryLister,
    reader: FileReader,
    streamer: RawStreamer,
    writer: FileWriter,
}

impl FileSystem {
    /// Canonicalize `root` and build every component on top of it.
    pub fn new(root: impl AsRef<Path>) -> FileResult<Self> {
        Ok(Self::with_root(SandboxRoot::new(root)?))
    }

    /// Build from an already-resolved root.
    pub fn with_root(root: SandboxRoot) -> Self {
        let root = Arc::new(root);
        Self {
            lister: DirectoryLister::new(root.clone()),
            reader: FileReader::new(root.clone()),
            streamer: RawStreamer::new(root.clone()),
            writer: FileWriter::new(root.clone()),
            root,
        }
    }

    /// The canonical sandbox root.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Resolve `rel` to a canonical path inside the root.
    pub fn resolve(&self, rel: &str) -> FileResult<ResolvedPath> {
        self.root.resolve(rel)
    }

    /// List the directory at `rel`.
    pub fn list(&self, rel: &str) -> FileResult<DirListing> {
        self.lister.list(rel)
    }

    /// Read a bounded preview of the file at `rel`.
    pub fn read(&self, rel: &str) -> FileResult<FileContent> {
        self.reader.read(rel)
    }

    /// Open the file at `rel` for raw transfer.
    pub fn open_raw(&self, rel: &str) -> FileResult<RawFile> {
        self.streamer.open_raw(rel)
    }

    /// Atomically replace the contents of the existing file at `rel`.
    pub fn write(&self, rel: &str, data: &[u8]) -> FileResult<()> {
        self.writer.write(rel, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_facade_shares_root() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("f.txt"), "x").unwrap();

        let files = FileSystem::new(temp_dir.path()).unwrap();
        assert_eq!(files.root(), fs::canonicalize(temp_dir.path()).unwrap());
        assert_eq!(files.resolve(".").unwrap().as_path(), files.root());
        assert_eq!(files.list(".").unwrap().entries.len(), 1);
    }

    #[test]
    fn test_facade_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FileSystem>();
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileSystem::new(temp_dir.path().join("missing"));
        assert!(matches!(result, Err(FileError::RootResolution { .. })));
    }
}
