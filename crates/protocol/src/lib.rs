//! # Sandbox Protocol Library
//!
//! Serializable data model for the sandboxed file-access subsystem.
//!
//! The sandbox crate produces these values; the HTTP layer that sits in
//! front of it serializes them to JSON for browser clients. Keeping them in
//! their own crate lets both sides agree on field names without pulling in
//! any filesystem code.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{to_json, DirEntry};
//!
//! let entry = DirEntry {
//!     name: "notes.md".to_string(),
//!     size: 12,
//!     is_dir: false,
//!     mod_time: 0,
//!     extension: ".md".to_string(),
//! };
//! assert!(to_json(&entry).unwrap().contains("\"isDir\":false"));
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Listing, entry and preview types
//! - [`error`]: Error types

pub mod error;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{
    from_json, to_json, to_json_pretty, ContentCategory, DirEntry, DirListing, FileContent,
};
