//! Content-type detection: file extension first, then sniffing the bytes.

use crate::input::Comparable;

/// A detected content type, determining which semantic-hash variant
/// applies and how severely a semantic change scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, std::hash::Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// JSON object or array.
    Json,
    /// Turtle/RDF source.
    Rdf,
    /// Source code (comment/whitespace-insensitive semantic hash applies).
    Code,
    /// Anything else: generic text.
    Text,
}

impl ContentType {
    /// Whether a semantic change in this content type is `critical`
    /// (code/RDF are critical; JSON is major).
    pub fn semantic_change_is_critical(self) -> bool {
        matches!(self, Self::Code | Self::Rdf)
    }
}

/// Detect the content type of `input`: extension first, then sniffing.
pub fn detect_content_type(input: &Comparable) -> ContentType {
    if input.is_json_value() {
        return ContentType::Json;
    }
    if let Some(ext) = input.extension() {
        if let Some(t) = by_extension(ext) {
            return t;
        }
    }
    sniff(&input.bytes())
}

fn by_extension(ext: &str) -> Option<ContentType> {
    match ext.to_ascii_lowercase().as_str() {
        "json" => Some(ContentType::Json),
        "ttl" | "turtle" | "n3" => Some(ContentType::Rdf),
        "rs" | "go" | "py" | "js" | "ts" | "java" | "c" | "cpp" | "h" => Some(ContentType::Code),
        "txt" | "md" => Some(ContentType::Text),
        _ => None,
    }
}

fn sniff(bytes: &[u8]) -> ContentType {
    let Ok(text) = std::str::from_utf8(bytes) else { return ContentType::Text };
    let trimmed = text.trim_start();

    if looks_like_json(trimmed) {
        return ContentType::Json;
    }
    if looks_like_turtle(trimmed) {
        return ContentType::Rdf;
    }
    ContentType::Text
}

fn looks_like_json(text: &str) -> bool {
    if !(text.starts_with('{') || text.starts_with('[')) {
        return false;
    }
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

fn looks_like_turtle(text: &str) -> bool {
    text.starts_with("@prefix") || text.starts_with("@base") || text.contains("a <") || text.lines().any(|l| l.trim_start().starts_with('<'))
}
