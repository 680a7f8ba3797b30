//! The four input shapes the drift detector accepts.

use serde_json::Value;

/// One side of a comparison (`expected` or `actual`).
#[derive(Debug, Clone)]
pub enum Comparable {
    /// A UTF-8 string.
    Text(String),
    /// A raw byte buffer (may be non-UTF-8).
    Bytes(Vec<u8>),
    /// An already-parsed JSON object/array.
    Json(Value),
    /// A file-like value: a path (for extension-based type sniffing) and content.
    File {
        /// Logical or on-disk path, used for extension-based detection.
        path: String,
        /// File content.
        content: Vec<u8>,
    },
}

impl Comparable {
    /// Construct from a file path and its bytes.
    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::File { path: path.into(), content: content.into() }
    }

    /// The raw bytes this input represents.
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.as_bytes().to_vec(),
            Self::Bytes(b) => b.clone(),
            Self::Json(v) => serde_json::to_vec(v).unwrap_or_default(),
            Self::File { content, .. } => content.clone(),
        }
    }

    /// The path's extension, if this input carries one.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::File { path, .. } => path.rsplit('.').next().filter(|e| *e != path.as_str()),
            _ => None,
        }
    }

    /// `true` if this input is natively a JSON value (skips re-parsing for
    /// content-type sniffing).
    pub fn is_json_value(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}
