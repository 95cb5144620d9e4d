//! Bounded file previews.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use protocol::{ContentCategory, FileContent};
use tracing::debug;

use super::browser::extension_of;
use super::classify::{classify, SNIFF_LEN};
use super::error::{FileError, FileResult};
use super::resolver::SandboxRoot;
use super::MAX_FILE_SIZE;

/// Reads and classifies files for inline preview.
#[derive(Debug, Clone)]
pub struct FileReader {
    root: Arc<SandboxRoot>,
}

impl FileReader {
    /// Create a reader bound to `root`.
    pub fn new(root: Arc<SandboxRoot>) -> Self {
        Self { root }
    }

    /// Read a preview of the file at `rel`.
    ///
    /// Directories yield `is_dir = true` and no content. Files whose leading
    /// bytes do not classify as text yield metadata only. Text files yield at
    /// most [`MAX_FILE_SIZE`] bytes of content, with `truncated` set when the
    /// file is larger; `size` always reports the full on-disk size.
    pub fn read(&self, rel: &str) -> FileResult<FileContent> {
        let abs_path = self.root.resolve(rel)?.into_path_buf();

        let metadata = fs::metadata(&abs_path).map_err(|e| FileError::io("stat", &abs_path, e))?;
        if metadata.is_dir() {
            debug!(path = rel, "Read on directory, returning marker");
            return Ok(FileContent {
                path: rel.to_string(),
                abs_path,
                is_dir: true,
                size: metadata.len(),
                extension: String::new(),
                content: None,
                content_type: None,
                truncated: false,
            });
        }

        let mut file = File::open(&abs_path).map_err(|e| FileError::io("open", &abs_path, e))?;
        let size = file
            .metadata()
            .map_err(|e| FileError::io("stat", &abs_path, e))?
            .len();

        let mut sample = Vec::with_capacity(SNIFF_LEN);
        file.by_ref()
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut sample)
            .map_err(|e| FileError::io("read", &abs_path, e))?;
        let category = classify(&sample);

        let extension = file_extension(&abs_path);
        if category != ContentCategory::Text {
            debug!(path = rel, %category, size, "Non-text file, returning metadata only");
            return Ok(FileContent {
                path: rel.to_string(),
                abs_path,
                is_dir: false,
                size,
                extension,
                content: None,
                content_type: Some(category),
                truncated: false,
            });
        }

        file.seek(SeekFrom::Start(0))
            .map_err(|e| FileError::io("seek", &abs_path, e))?;

        let mut content = Vec::with_capacity(size.min(MAX_FILE_SIZE) as usize);
        file.by_ref()
            .take(MAX_FILE_SIZE)
            .read_to_end(&mut content)
            .map_err(|e| FileError::io("read", &abs_path, e))?;
        let truncated = size > MAX_FILE_SIZE;

        debug!(path = rel, size, truncated, "Read text file");

        Ok(FileContent {
            path: rel.to_string(),
            abs_path,
            is_dir: false,
            size,
            extension,
            content: Some(content),
            content_type: Some(ContentCategory::Text),
            truncated,
        })
    }
}

fn file_extension(path: &Path) -> String {
    path.file_name()
        .map(|n| extension_of(&n.to_string_lossy()).to_string())
        .unwrap_or_default()
}
