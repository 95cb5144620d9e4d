//! End-to-end integration tests for the sandbox.
//!
//! These tests drive the public `FileSystem` API the way a server front-end would:
//! - List, read, write and raw round trips
//! - Traversal and symlink escapes
//! - Preview truncation
//! - Concurrent writers

use std::fs;
use std::io::Read;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::Path;

use protocol::ContentCategory;
use sandbox::files::{resolve, FileError};
use sandbox::{FileSystem, MAX_FILE_SIZE};
use tempfile::TempDir;

fn create_test_root() -> (FileSystem, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let files = FileSystem::new(temp_dir.path()).unwrap();
    (files, temp_dir)
}

// =============================================================================
// Full Flow
// =============================================================================

#[test]
fn test_list_read_write_flow() {
    let (files, temp_dir) = create_test_root();
    fs::create_dir(temp_dir.path().join("a")).unwrap();
    fs::write(temp_dir.path().join("a/b.txt"), "hi").unwrap();

    let listing = files.list("a").unwrap();
    assert_eq!(listing.entries.len(), 1);
    let entry = &listing.entries[0];
    assert_eq!(entry.name, "b.txt");
    assert_eq!(entry.size, 2);
    assert!(!entry.is_dir);
    assert_eq!(entry.extension, ".txt");

    let content = files.read("a/b.txt").unwrap();
    assert_eq!(content.content.as_deref(), Some(&b"hi"[..]));
    assert_eq!(content.content_type, Some(ContentCategory::Text));
    assert!(!content.truncated);
    assert_eq!(content.size, 2);

    files.write("a/b.txt", b"bye").unwrap();
    let content = files.read("a/b.txt").unwrap();
    assert_eq!(content.content.as_deref(), Some(&b"bye"[..]));

    let result = files.resolve("../etc/passwd");
    assert!(matches!(result, Err(FileError::PathOutsideRoot(_))));
}

#[test]
fn test_listing_serializes_for_clients() {
    let (files, temp_dir) = create_test_root();
    fs::create_dir(temp_dir.path().join("a")).unwrap();
    fs::write(temp_dir.path().join("a/b.txt"), "hi").unwrap();

    let json = protocol::to_json(&files.list("a").unwrap()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["path"], "a");
    assert_eq!(value["entries"][0]["name"], "b.txt");
    assert_eq!(value["entries"][0]["isDir"], false);
    assert!(value["entries"][0]["modTime"].is_u64());
}

#[test]
fn test_resolve_dot_is_canonical_root() {
    let (files, temp_dir) = create_test_root();
    let canonical = fs::canonicalize(temp_dir.path()).unwrap();

    assert_eq!(files.resolve(".").unwrap().as_path(), canonical);
    assert_eq!(resolve(temp_dir.path(), ".").unwrap().as_path(), canonical);
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_text_roundtrip() {
    let (files, temp_dir) = create_test_root();
    fs::write(temp_dir.path().join("notes.md"), "").unwrap();

    let payload = "# Title\n\nSome text with unicode: \u{00e9}\u{4e2d}\n".repeat(100);
    files.write("notes.md", payload.as_bytes()).unwrap();

    let content = files.read("notes.md").unwrap();
    assert_eq!(content.content.unwrap(), payload.as_bytes());
}

#[test]
fn test_binary_roundtrip_through_raw() {
    let (files, temp_dir) = create_test_root();
    fs::write(temp_dir.path().join("data.bin"), "placeholder").unwrap();

    let payload = b"\x00\x01binary\x00payload\xff".to_vec();
    files.write("data.bin", &payload).unwrap();

    let content = files.read("data.bin").unwrap();
    assert_eq!(content.content_type, Some(ContentCategory::Binary));
    assert!(content.content.is_none());
    assert_eq!(content.size, payload.len() as u64);

    let mut raw = files.open_raw("data.bin").unwrap();
    let mut bytes = Vec::new();
    raw.read_to_end(&mut bytes).unwrap();
    assert_eq!(bytes, payload);
}

// =============================================================================
// Limits
// =============================================================================

#[test]
fn test_preview_truncation() {
    let (files, temp_dir) = create_test_root();
    let text: Vec<u8> = b"0123456789abcdef\n"
        .iter()
        .copied()
        .cycle()
        .take(MAX_FILE_SIZE as usize + 1)
        .collect();
    fs::write(temp_dir.path().join("huge.txt"), &text).unwrap();

    let content = files.read("huge.txt").unwrap();
    assert!(content.truncated);
    assert_eq!(content.size, MAX_FILE_SIZE + 1);
    let preview = content.content.unwrap();
    assert_eq!(preview.len(), MAX_FILE_SIZE as usize);
    assert_eq!(preview[..], text[..MAX_FILE_SIZE as usize]);
}

#[test]
fn test_oversized_write_rejected() {
    let (files, temp_dir) = create_test_root();
    fs::write(temp_dir.path().join("f.txt"), "keep").unwrap();

    let result = files.write("f.txt", &vec![b'x'; MAX_FILE_SIZE as usize + 1]);
    assert!(matches!(result, Err(FileError::FileTooLarge { .. })));
    assert_eq!(fs::read(temp_dir.path().join("f.txt")).unwrap(), b"keep");
}

// =============================================================================
// Escapes
// =============================================================================

#[test]
fn test_no_operation_escapes_root() {
    let (files, temp_dir) = create_test_root();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.txt"), "secret").unwrap();
    symlink(outside.path(), temp_dir.path().join("escape")).unwrap();

    let escapes = [
        "../secret.txt",
        "escape/secret.txt",
        "escape",
        "a/../../secret.txt",
    ];
    for path in escapes {
        let err = files.resolve(path).unwrap_err();
        assert!(err.is_security_rejection(), "{} -> {:?}", path, err);
        assert!(files.list(path).unwrap_err().is_security_rejection());
        assert!(files.read(path).unwrap_err().is_security_rejection());
        assert!(files.open_raw(path).unwrap_err().is_security_rejection());
        assert!(files.write(path, b"pwned").unwrap_err().is_security_rejection());
    }

    let absolute = outside.path().join("secret.txt");
    let result = files.read(absolute.to_str().unwrap());
    assert!(matches!(result, Err(FileError::AbsolutePathNotAllowed(_))));

    assert_eq!(fs::read(outside.path().join("secret.txt")).unwrap(), b"secret");
}

// =============================================================================
// Listing Contract
// =============================================================================

#[test]
fn test_sort_order() {
    let (files, temp_dir) = create_test_root();
    fs::create_dir(temp_dir.path().join("b")).unwrap();
    fs::create_dir(temp_dir.path().join("a")).unwrap();
    fs::write(temp_dir.path().join("z"), "").unwrap();
    fs::write(temp_dir.path().join("c"), "").unwrap();

    let names: Vec<String> = files
        .list(".")
        .unwrap()
        .entries
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c", "z"]);
}

#[test]
fn test_vcs_directory_contents_hidden() {
    let (files, temp_dir) = create_test_root();
    fs::create_dir_all(temp_dir.path().join(".git/refs")).unwrap();
    fs::write(temp_dir.path().join(".git/config"), "[core]\n").unwrap();

    assert!(files.list(".git").unwrap().entries.is_empty());

    let top = files.list(".").unwrap();
    assert!(top
        .entries
        .iter()
        .any(|e| e.name == ".git" && e.is_dir));
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn test_mode_preserved_after_write() {
    let (files, temp_dir) = create_test_root();
    let path = temp_dir.path().join("key.pem");
    fs::write(&path, "old").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    files.write("key.pem", b"new").unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
}

#[test]
fn test_concurrent_writers() {
    let (files, temp_dir) = create_test_root();
    fs::write(temp_dir.path().join("race.txt"), "").unwrap();

    let payloads: Vec<Vec<u8>> = (b'a'..=b'd').map(|c| vec![c; 128 * 1024]).collect();

    std::thread::scope(|s| {
        for payload in &payloads {
            let files = files.clone();
            s.spawn(move || files.write("race.txt", payload).unwrap());
        }
    });

    let content = fs::read(temp_dir.path().join("race.txt")).unwrap();
    assert!(payloads.iter().any(|p| *p == content));
    assert_only_entry(temp_dir.path(), "race.txt");
}

fn assert_only_entry(dir: &Path, name: &str) {
    let names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![name.to_string()]);
}
