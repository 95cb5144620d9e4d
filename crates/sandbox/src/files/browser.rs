//! Directory listing inside the sandbox.
//!
//! Listings are resolved through [`SandboxRoot`] first and sorted
//! directories-first, then by name. Clients render entries in the order
//! returned, so the ordering is part of the contract.

use std::fs;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::SystemTime;

use protocol::{DirEntry, DirListing};
use tracing::debug;

use super::error::{FileError, FileResult};
use super::resolver::SandboxRoot;

/// Directory name whose contents are never enumerated.
pub const VCS_DIR_NAME: &str = ".git";

/// Lists directories within a sandbox root.
#[derive(Debug, Clone)]
pub struct DirectoryLister {
    root: Arc<SandboxRoot>,
}

impl DirectoryLister {
    /// Create a lister bound to `root`.
    pub fn new(root: Arc<SandboxRoot>) -> Self {
        Self { root }
    }

    /// List the direct children of the directory at `rel`.
    ///
    /// Hidden entries are included. Entries whose metadata cannot be read are
    /// skipped. If any segment of `rel` is the version-control metadata
    /// directory, the listing succeeds with no entries.
    pub fn list(&self, rel: &str) -> FileResult<DirListing> {
        let resolved = self.root.resolve(rel)?;
        let abs_path = resolved.into_path_buf();

        let metadata = fs::metadata(&abs_path).map_err(|e| FileError::io("stat", &abs_path, e))?;
        if !metadata.is_dir() {
            return Err(FileError::NotDirectory(abs_path));
        }

        if is_inside_vcs_dir(rel) {
            debug!(path = rel, "Suppressing version-control directory contents");
            return Ok(DirListing {
                path: rel.to_string(),
                abs_path,
                entries: Vec::new(),
            });
        }

        let read_dir = fs::read_dir(&abs_path).map_err(|e| FileError::io("readdir", &abs_path, e))?;

        let mut entries = Vec::new();
        for entry_result in read_dir {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue,
            };

            // Follows symlinks; a dangling link has no metadata and is skipped.
            let metadata = match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(_) => continue,
            };

            // Names that are not valid UTF-8 could not be addressed again
            // through the string-based API.
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "Skipping entry with non-UTF-8 name");
                    continue;
                }
            };
            let is_dir = metadata.is_dir();
            let extension = if is_dir {
                String::new()
            } else {
                extension_of(&name).to_string()
            };

            entries.push(DirEntry {
                name,
                size: metadata.len(),
                is_dir,
                mod_time: unix_seconds(metadata.modified().ok()),
                extension,
            });
        }

        sort_entries(&mut entries);
        debug!(path = rel, count = entries.len(), "Listed directory");

        Ok(DirListing {
            path: rel.to_string(),
            abs_path,
            entries,
        })
    }
}

/// Directories first, then files; byte-wise by name within each group.
pub fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.as_bytes().cmp(b.name.as_bytes()))
    });
}

/// The suffix of `name` from its last `.`, including the dot.
///
/// Returns an empty string when there is no dot.
pub fn extension_of(name: &str) -> &str {
    name.rfind('.').map(|i| &name[i..]).unwrap_or("")
}

fn is_inside_vcs_dir(rel: &str) -> bool {
    Path::new(rel)
        .components()
        .any(|c| matches!(c, Component::Normal(part) if part == VCS_DIR_NAME))
}

pub(crate) fn unix_seconds(time: Option<SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
