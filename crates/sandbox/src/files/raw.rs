//! Raw byte streams for full-fidelity transfer.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::classify::{sniff_mime, SNIFF_LEN};
use super::error::{FileError, FileResult};
use super::resolver::SandboxRoot;

/// An open file positioned at its start, with its sniffed MIME type.
///
/// The handle is closed when this value is dropped.
#[derive(Debug)]
pub struct RawFile {
    file: File,
    mime_type: String,
    size: u64,
    path: PathBuf,
}

impl RawFile {
    /// Full (non-coarsened) MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes at open time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Resolved absolute path of the opened file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the underlying file handle to the caller.
    pub fn into_inner(self) -> File {
        self.file
    }
}

impl Read for RawFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for RawFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

/// Opens files for unbounded byte transfer.
#[derive(Debug, Clone)]
pub struct RawStreamer {
    root: Arc<SandboxRoot>,
}

impl RawStreamer {
    /// Create a streamer bound to `root`.
    pub fn new(root: Arc<SandboxRoot>) -> Self {
        Self { root }
    }

    /// Open the file at `rel`, sniff its MIME type and rewind it.
    ///
    /// No size cap is applied; bounding the transfer is up to the caller.
    pub fn open_raw(&self, rel: &str) -> FileResult<RawFile> {
        let path = self.root.resolve(rel)?.into_path_buf();

        let mut file = File::open(&path).map_err(|e| FileError::io("open", &path, e))?;
        let metadata = file.metadata().map_err(|e| FileError::io("stat", &path, e))?;
        if metadata.is_dir() {
            return Err(FileError::IsDirectory(path));
        }

        let mut sample = Vec::with_capacity(SNIFF_LEN);
        file.by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut sample)
            .map_err(|e| FileError::io("read", &path, e))?;
        let mime_type = sniff_mime(&sample);

        file.seek(SeekFrom::Start(0))
            .map_err(|e| FileError::io("seek", &path, e))?;

        debug!(path = rel, mime = %mime_type, size = metadata.len(), "Opened raw stream");

        Ok(RawFile {
            file,
            mime_type,
            size: metadata.len(),
            path,
        })
    }
}
