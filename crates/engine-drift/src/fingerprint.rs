//! Fingerprinting: content hash, semantic hash, size, content type,
//! cached by `(contentHash, contentType)`.

use std::collections::HashMap;
use std::sync::Mutex;

use engine_core::canon;
use engine_core::Clock;

use crate::content_type::ContentType;
use crate::input::Comparable;

/// `{ contentHash, semanticHash, size, contentType }` for one input.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint {
    /// SHA-256 of the raw bytes.
    pub content_hash: String,
    /// Content-type-appropriate semantic hash.
    pub semantic_hash: String,
    /// Byte length of the content.
    pub size: usize,
    /// Detected content type.
    pub content_type: ContentType,
}

/// Computes and caches fingerprints by `(contentHash, contentType)`, so
/// repeated comparisons against the same bytes never re-run semantic
/// hashing.
#[derive(Default)]
pub struct FingerprintCache {
    cache: Mutex<HashMap<(String, ContentType), Fingerprint>>,
}

impl FingerprintCache {
    /// Construct an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict every cached fingerprint.
    pub fn clear(&self) {
        self.cache.lock().expect("fingerprint cache poisoned").clear();
    }

    /// Fingerprint `input`, reusing a cached result for identical
    /// `(contentHash, contentType)` pairs.
    pub fn fingerprint(&self, input: &Comparable, clock: &dyn Clock) -> Fingerprint {
        let bytes = input.bytes();
        let content_hash = canon::sha256_hex(&bytes);
        let content_type = crate::content_type::detect_content_type(input);
        let key = (content_hash.clone(), content_type);

        if let Some(hit) = self.cache.lock().expect("fingerprint cache poisoned").get(&key).cloned() {
            return hit;
        }

        let semantic_hash = semantic_hash(&bytes, content_type, clock);
        let fingerprint = Fingerprint { content_hash, semantic_hash, size: bytes.len(), content_type };
        self.cache.lock().expect("fingerprint cache poisoned").insert(key, fingerprint.clone());
        fingerprint
    }
}

fn semantic_hash(bytes: &[u8], content_type: ContentType, clock: &dyn Clock) -> String {
    match content_type {
        ContentType::Json => match serde_json::from_slice::<serde_json::Value>(bytes) {
            Ok(value) => canon::json_semantic_hash(&value),
            Err(_) => canon::sha256_hex(bytes),
        },
        ContentType::Rdf => rdf_semantic_hash(bytes, clock).unwrap_or_else(|| canon::sha256_hex(bytes)),
        ContentType::Code => match std::str::from_utf8(bytes) {
            Ok(code) => canon::code_semantic_hash(code),
            Err(_) => canon::sha256_hex(bytes),
        },
        ContentType::Text => canon::sha256_hex(bytes),
    }
}

fn rdf_semantic_hash(bytes: &[u8], clock: &dyn Clock) -> Option<String> {
    let graph = engine_graph::ingest(&[engine_graph::Source::turtle(bytes.to_vec())], clock, None).ok()?;
    Some(canon::rdf_semantic_hash(graph.triples.iter().map(|t| (t.subject.as_str(), t.predicate.as_str(), t.object.as_str()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::parse("2026-01-01T00:00:00.000Z").unwrap()
    }

    #[test]
    fn identical_bytes_reuse_the_cached_fingerprint() {
        let cache = FingerprintCache::new();
        let input = Comparable::Text("hello".to_string());
        let a = cache.fingerprint(&input, &clock());
        let b = cache.fingerprint(&input, &clock());
        assert_eq!(a, b);
    }

    #[test]
    fn json_semantic_hash_ignores_key_order() {
        let cache = FingerprintCache::new();
        let a = cache.fingerprint(&Comparable::Text(r#"{"a":1,"b":2}"#.to_string()), &clock());
        let b = cache.fingerprint(&Comparable::Text(r#"{"b":2,"a":1}"#.to_string()), &clock());
        assert_eq!(a.semantic_hash, b.semantic_hash);
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn rdf_semantic_hash_is_triple_order_independent() {
        let cache = FingerprintCache::new();
        let a = cache.fingerprint(
            &Comparable::Text("@prefix ex: <http://e/> . ex:s ex:p ex:o1 . ex:s ex:p ex:o2 .".to_string()),
            &clock(),
        );
        let b = cache.fingerprint(
            &Comparable::Text("@prefix ex: <http://e/> . ex:s ex:p ex:o2 . ex:s ex:p ex:o1 .".to_string()),
            &clock(),
        );
        assert_eq!(a.semantic_hash, b.semantic_hash);
    }
}
