//! Content sniffing and coarse classification.
//!
//! [`sniff_mime`] inspects at most [`SNIFF_LEN`] leading bytes and returns a
//! fine-grained MIME type. [`classify`] folds that into a [`ContentCategory`]
//! used to decide whether a file gets an inline preview.
//!
//! Both are heuristics. Text in encodings that embed NUL bytes (UTF-16
//! without a byte-order mark, for instance) comes out as binary.

use protocol::ContentCategory;

/// Number of leading bytes examined when sniffing.
pub const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Tags that mark a document as HTML when they open it (case-insensitive).
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Exact leading signatures not covered by magic-number detection.
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN),
];

/// Sniff a MIME type from the leading bytes of a file.
///
/// Only the first [`SNIFF_LEN`] bytes of `sample` are considered. Always
/// returns a valid MIME type, falling back to `application/octet-stream`.
pub fn sniff_mime(sample: &[u8]) -> String {
    let data = &sample[..sample.len().min(SNIFF_LEN)];

    if let Some(mime) = sniff_markup(data) {
        return mime.to_string();
    }

    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| data.starts_with(sig)) {
        return mime.to_string();
    }

    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if data.iter().copied().any(is_binary_byte) {
        OCTET_STREAM.to_string()
    } else {
        TEXT_PLAIN.to_string()
    }
}

/// Fold a MIME type into a coarse category.
///
/// Besides `text/*`, only bare XML/JSON types and the `+xml`/`+json`
/// structured suffixes count as text. Container formats whose names merely
/// mention XML (Office Open XML documents are ZIP archives) stay binary.
pub fn coarsen(mime: &str) -> ContentCategory {
    let essence = mime.split(';').next().unwrap_or_default().trim();

    if essence.starts_with("text/") {
        ContentCategory::Text
    } else if essence.starts_with("image/") {
        ContentCategory::Image
    } else if is_structured_text(essence) {
        ContentCategory::Text
    } else {
        ContentCategory::Binary
    }
}

fn is_structured_text(essence: &str) -> bool {
    matches!(essence, "application/xml" | "application/json")
        || essence.ends_with("+xml")
        || essence.ends_with("+json")
}

/// Classify a leading byte sample.
///
/// A sample the sniffer calls binary but which contains no NUL byte is
/// reclassified as text; sniffers routinely misfile scripts and config
/// files as opaque data.
pub fn classify(sample: &[u8]) -> ContentCategory {
    let data = &sample[..sample.len().min(SNIFF_LEN)];

    match coarsen(&sniff_mime(data)) {
        ContentCategory::Binary if !data.contains(&0) => ContentCategory::Text,
        category => category,
    }
}

fn sniff_markup(data: &[u8]) -> Option<&'static str> {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))?;
    let data = &data[start..];

    if data.starts_with(b"<?xml") {
        return Some("text/xml; charset=utf-8");
    }

    let is_html = HTML_TAGS.iter().any(|tag| {
        data.len() > tag.len()
            && data[..tag.len()].eq_ignore_ascii_case(tag)
            && matches!(data[tag.len()], b' ' | b'>')
    });
    is_html.then_some("text/html; charset=utf-8")
}

/// Control bytes that never appear in plain text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
