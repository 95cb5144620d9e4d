//! # Sandbox Library
//!
//! Sandboxed file access for a browser-facing terminal server.
//!
//! ## Overview
//!
//! Everything here operates on one local directory tree, the sandbox root,
//! fixed when a [`FileSystem`] is built. Callers hand in untrusted relative
//! paths; the library guarantees that no operation reads or writes anything
//! outside the root, including through symbolic links.
//!
//! - **Resolve**: validate a relative path and return its canonical form
//! - **List**: directory entries, directories first
//! - **Read**: text previews capped at 1 MiB, metadata only for binaries and images
//! - **OpenRaw**: an open byte stream plus sniffed MIME type
//! - **Write**: atomic temp-file-and-rename replacement of existing files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sandbox::FileSystem;
//!
//! fn main() -> anyhow::Result<()> {
//!     let files = FileSystem::new("/srv/projects")?;
//!
//!     let listing = files.list(".")?;
//!     for entry in &listing.entries {
//!         println!("{} {}", if entry.is_dir { "d" } else { "-" }, entry.name);
//!     }
//!
//!     files.write("notes.txt", b"updated")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`files`]: Path resolution, listing, previews, raw streams and writes
//! - [`config`]: Configuration loading and defaults
//! - [`logging`]: Tracing subscriber setup

pub mod config;
pub mod files;
pub mod logging;

// Re-export protocol for convenience
pub use protocol;

// Re-export config types for convenience
pub use config::Config;

// Re-export files types for convenience
pub use files::{
    DirectoryLister, FileError, FileErrorKind, FileReader, FileResult, FileSystem, FileWriter,
    RawFile, RawStreamer, ResolvedPath, SandboxRoot, MAX_FILE_SIZE,
};
