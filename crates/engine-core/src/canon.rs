//! Deterministic hashing and canonical JSON.
//!
//! Canonicalization rules: object keys are sorted
//! lexicographically and recursed into; arrays keep their element order
//! unless the caller explicitly asks for set semantics, in which case
//! elements are reordered by their own canonical-JSON string. Binary blobs
//! are represented as `{"__type":"Binary","data":"<base64>"}` and hashed
//! directly rather than canonicalized.

use base64::Engine as _;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fmt;

/// A lowercase hex-encoded SHA-256 digest (64 characters).
pub type Hash = String;

/// Failures from canonicalization or hashing.
#[derive(Debug, thiserror::Error)]
pub enum CanonError {
    /// The value could not be serialized (functions/symbols are rejected
    /// upstream by `serde_json`, but this also covers NaN/Infinity floats).
    #[error("value is not representable in canonical JSON: {0}")]
    InvalidInput(String),
}

/// Recursively canonicalize a JSON value: object keys sorted, arrays
/// recursed in place.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for k in keys {
                let v = &map[k];
                if v.is_null() {
                    continue;
                }
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonicalize a value with "set" semantics: array elements are reordered
/// by the lexicographic order of their own canonical-JSON string.
pub fn canonicalize_as_set(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut canon: Vec<(String, Value)> = items
                .iter()
                .map(|v| {
                    let c = canonicalize(v);
                    (serde_json::to_string(&c).unwrap_or_default(), c)
                })
                .collect();
            canon.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Array(canon.into_iter().map(|(_, v)| v).collect())
        }
        other => canonicalize(other),
    }
}

/// Encode a binary blob as the canonical `{"__type":"Binary","data":...}` shape.
pub fn encode_binary(bytes: &[u8]) -> Value {
    serde_json::json!({
        "__type": "Binary",
        "data": base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// SHA-256 of raw bytes, lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> Hash {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

/// `hash(x) = SHA-256(canonicalJSON(x))`.
pub fn hash_value<T: Serialize>(value: &T) -> Result<Hash, CanonError> {
    let raw = serde_json::to_value(value)
        .map_err(|e| CanonError::InvalidInput(e.to_string()))?;
    let canon = canonicalize(&raw);
    let bytes = serde_json::to_vec(&canon).map_err(|e| CanonError::InvalidInput(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// Hash an already-canonicalized (or raw) [`Value`] without re-serializing
/// through a typed intermediate.
pub fn hash_json(value: &Value) -> Hash {
    let canon = canonicalize(value);
    let bytes = serde_json::to_vec(&canon).expect("canonical JSON always serializes");
    sha256_hex(&bytes)
}

/// First 16 hex characters of a hash.
pub fn short_hash(full: &str) -> &str {
    &full[..full.len().min(16)]
}

/// Code semantic hash: strips line/block comments, collapses whitespace
/// runs, trims, then hashes. Intentionally lossy — never use this as a
/// cryptographic artifact identity, only for drift classification.
pub fn code_semantic_hash(code: &str) -> Hash {
    let stripped = strip_code_comments(code);
    let collapsed = collapse_whitespace(&stripped);
    sha256_hex(collapsed.trim().as_bytes())
}

fn strip_code_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    let mut in_block = false;
    let mut in_line = false;
    while let Some(c) = chars.next() {
        if in_line {
            if c == '\n' {
                in_line = false;
                out.push(c);
            }
            continue;
        }
        if in_block {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                in_block = false;
            }
            continue;
        }
        if c == '/' && chars.peek() == Some(&'/') {
            chars.next();
            in_line = true;
            continue;
        }
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            in_block = true;
            continue;
        }
        out.push(c);
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// JSON semantic hash: canonical JSON then hash — identical to
/// [`hash_json`], named separately to mirror the three semantic-hash
/// variants exposed per artifact kind.
pub fn json_semantic_hash(value: &Value) -> Hash {
    hash_json(value)
}

/// RDF semantic hash: triples sorted by `(subject, predicate, object)`,
/// then hashed as a newline-joined byte stream. Identical triple sets in
/// any source order produce identical hashes.
pub fn rdf_semantic_hash<S: AsRef<str>>(triples: impl IntoIterator<Item = (S, S, S)>) -> Hash {
    let mut rows: Vec<String> = triples
        .into_iter()
        .map(|(s, p, o)| format!("{}\u{1}{}\u{1}{}", s.as_ref(), p.as_ref(), o.as_ref()))
        .collect();
    rows.sort();
    sha256_hex(rows.join("\n").as_bytes())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use fmt::Write;
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let v = json!({"b": 1, "a": 2});
        let c = canonicalize(&v);
        let s = serde_json::to_string(&c).unwrap();
        assert_eq!(s, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn arrays_preserve_order_by_default() {
        let v = json!([3, 1, 2]);
        let c = canonicalize(&v);
        assert_eq!(c, json!([3, 1, 2]));
    }

    #[test]
    fn set_semantics_sort_by_canonical_string() {
        let v = json!(["b", "a", "c"]);
        let c = canonicalize_as_set(&v);
        assert_eq!(c, json!(["a", "b", "c"]));
    }

    #[test]
    fn null_fields_are_omitted() {
        let v = json!({"a": 1, "b": null});
        let c = canonicalize(&v);
        assert_eq!(c, json!({"a": 1}));
    }

    #[test]
    fn hash_is_stable_across_key_order() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(hash_json(&a), hash_json(&b));
    }

    #[test]
    fn short_hash_is_16_chars() {
        let h = sha256_hex(b"hello");
        assert_eq!(short_hash(&h).len(), 16);
    }

    #[test]
    fn rdf_semantic_hash_is_order_independent() {
        let a = vec![("s1", "p1", "o1"), ("s2", "p2", "o2")];
        let b = vec![("s2", "p2", "o2"), ("s1", "p1", "o1")];
        assert_eq!(rdf_semantic_hash(a), rdf_semantic_hash(b));
    }

    #[test]
    fn code_semantic_hash_ignores_comments_and_whitespace() {
        let a = "fn main() {\n  // hi\n  let x = 1;\n}\n";
        let b = "fn   main()   {  let x   =   1;  }";
        assert_eq!(code_semantic_hash(a), code_semantic_hash(b));
    }

    #[test]
    fn code_semantic_hash_strips_block_comments() {
        let a = "let x = 1; /* note */";
        let b = "let x = 1;";
        assert_eq!(code_semantic_hash(a), code_semantic_hash(b));
    }

    #[test]
    fn binary_encodes_as_tagged_base64() {
        let v = encode_binary(b"hi");
        assert_eq!(v["__type"], "Binary");
        assert_eq!(v["data"], "aGk=");
    }

    proptest::proptest! {
        #[test]
        fn hash_value_never_panics_on_arbitrary_maps(
            keys in proptest::collection::vec("[a-z]{1,5}", 0..8),
            vals in proptest::collection::vec(0i64..1000, 0..8),
        ) {
            let map: std::collections::BTreeMap<String, i64> =
                keys.into_iter().zip(vals).collect();
            let _ = hash_value(&map).unwrap();
        }
    }
}
