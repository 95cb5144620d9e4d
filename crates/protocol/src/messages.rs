//! Data model shared between the file-access core and its callers.
//!
//! These types are returned by the sandbox operations and serialized to JSON
//! by the HTTP layer. Field names on the wire are camelCase (`isDir`,
//! `modTime`, `absPath`, `contentType`) and must not change: browser clients
//! read them directly.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Coarse content category assigned to a file by sniffing its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    /// Previewable text (including XML and JSON).
    Text,
    /// An image, previewed through the raw byte stream.
    Image,
    /// Anything else.
    Binary,
}

impl ContentCategory {
    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "binary" => Ok(Self::Binary),
            other => Err(ProtocolError::UnknownCategory(other.to_string())),
        }
    }
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    /// Entry name (not full path). Always valid UTF-8; entries whose names
    /// are not are left out of listings.
    pub name: String,
    /// Size in bytes as reported by the filesystem.
    pub size: u64,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Last modified timestamp (Unix epoch seconds).
    pub mod_time: u64,
    /// Extension including the leading dot; empty for directories.
    pub extension: String,
}

/// Result of listing a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirListing {
    /// The relative path exactly as the caller supplied it.
    pub path: String,
    /// The resolved absolute path.
    pub abs_path: PathBuf,
    /// Directories first, then files, each group ordered by name.
    pub entries: Vec<DirEntry>,
}

/// Preview of a single file (or directory marker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// The relative path exactly as the caller supplied it.
    pub path: String,
    /// The resolved absolute path.
    pub abs_path: PathBuf,
    /// Whether the path is a directory. No content is read for directories.
    pub is_dir: bool,
    /// True on-disk size, even when `content` was truncated.
    pub size: u64,
    /// Extension including the leading dot; empty for directories.
    pub extension: String,
    /// Inline bytes, present only for the text category.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "content_text"
    )]
    pub content: Option<Vec<u8>>,
    /// Coarse category; `None` (serialized as `""`) for directories.
    #[serde(with = "category_or_empty")]
    pub content_type: Option<ContentCategory>,
    /// Whether `content` holds only the leading part of the file.
    pub truncated: bool,
}

impl FileContent {
    /// Content as a string, replacing invalid UTF-8 sequences.
    pub fn content_lossy(&self) -> Option<std::borrow::Cow<'_, str>> {
        self.content.as_deref().map(String::from_utf8_lossy)
    }
}

/// Serialize a value as compact JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serialize a value as indented JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Parse a value from JSON.
pub fn from_json<'a, T: Deserialize<'a>>(s: &'a str) -> Result<T> {
    Ok(serde_json::from_str(s)?)
}

mod content_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&*String::from_utf8_lossy(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.map(String::into_bytes))
    }
}

mod category_or_empty {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ContentCategory;

    pub fn serialize<S: Serializer>(
        value: &Option<ContentCategory>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.map(|c| c.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<ContentCategory>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn text_file() -> FileContent {
        FileContent {
            path: "a/b.txt".to_string(),
            abs_path: PathBuf::from("/srv/root/a/b.txt"),
            is_dir: false,
            size: 2,
            extension: ".txt".to_string(),
            content: Some(b"hi".to_vec()),
            content_type: Some(ContentCategory::Text),
            truncated: false,
        }
    }

    #[test]
    fn test_dir_entry_field_names() {
        let entry = DirEntry {
            name: "b.txt".to_string(),
            size: 2,
            is_dir: false,
            mod_time: 1704067200,
            extension: ".txt".to_string(),
        };

        let value: Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "b.txt",
                "size": 2,
                "isDir": false,
                "modTime": 1704067200,
                "extension": ".txt",
            })
        );
    }

    #[test]
    fn test_listing_field_names() {
        let listing = DirListing {
            path: "a".to_string(),
            abs_path: PathBuf::from("/srv/root/a"),
            entries: Vec::new(),
        };

        let value: Value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["path"], "a");
        assert_eq!(value["absPath"], "/srv/root/a");
        assert_eq!(value["entries"], json!([]));
    }

    #[test]
    fn test_file_content_text_serializes_as_string() {
        let value: Value = serde_json::to_value(text_file()).unwrap();
        assert_eq!(value["content"], "hi");
        assert_eq!(value["contentType"], "text");
        assert_eq!(value["truncated"], false);
        assert_eq!(value["isDir"], false);
    }

    #[test]
    fn test_file_content_without_content_omits_field() {
        let mut file = text_file();
        file.content = None;
        file.content_type = Some(ContentCategory::Binary);

        let value: Value = serde_json::to_value(&file).unwrap();
        assert!(value.get("content").is_none());
        assert_eq!(value["contentType"], "binary");
    }

    #[test]
    fn test_directory_has_empty_content_type() {
        let file = FileContent {
            path: "a".to_string(),
            abs_path: PathBuf::from("/srv/root/a"),
            is_dir: true,
            size: 4096,
            extension: String::new(),
            content: None,
            content_type: None,
            truncated: false,
        };

        let json = to_json(&file).unwrap();
        assert!(json.contains("\"contentType\":\"\""));

        let parsed: FileContent = from_json(&json).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_file_content_parses_back() {
        let json = to_json_pretty(&text_file()).unwrap();
        let parsed: FileContent = from_json(&json).unwrap();
        assert_eq!(parsed, text_file());
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        let json = r#"{"path":"x","absPath":"/x","isDir":false,"size":0,
            "extension":"","contentType":"video","truncated":false}"#;
        let result: Result<FileContent> = from_json(json);
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));
    }

    #[test]
    fn test_invalid_utf8_content_is_lossy() {
        let mut file = text_file();
        file.content = Some(vec![b'o', b'k', 0xff]);

        assert_eq!(file.content_lossy().unwrap(), "ok\u{fffd}");
        let value: Value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["content"], "ok\u{fffd}");
    }

    #[test]
    fn test_category_parse_and_display() {
        for category in [
            ContentCategory::Text,
            ContentCategory::Image,
            ContentCategory::Binary,
        ] {
            assert_eq!(category.to_string().parse::<ContentCategory>().unwrap(), category);
        }
        assert!("TEXT".parse::<ContentCategory>().is_err());
    }
}
