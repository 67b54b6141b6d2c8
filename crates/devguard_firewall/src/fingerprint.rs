//! Canonical-JSON + SHA-256 fingerprinting, generalized from single-value
//! redaction hashing to whole-pattern hashing: object keys are re-serialized
//! through a `BTreeMap` so two semantically-equal patterns with differently
//! ordered keys hash identically.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let sorted: BTreeMap<String, Value> = obj
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            serde_json::to_value(sorted).expect("BTreeMap<String, Value> always serializes")
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// `sha256("{error_type}:{canonical_json(pattern)}")`, hex-encoded.
pub fn error_id(error_type: &str, pattern: &Value) -> String {
    let canonical = canonicalize(pattern).to_string();
    let mut hasher = Sha256::new();
    hasher.update(error_type.as_bytes());
    hasher.update(b":");
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_the_fingerprint() {
        let a = json!({"exception": "TypeError", "module": "npm"});
        let b = json!({"module": "npm", "exception": "TypeError"});
        assert_eq!(error_id("npm_install", &a), error_id("npm_install", &b));
    }

    #[test]
    fn different_patterns_hash_differently() {
        let a = json!({"exception": "TypeError"});
        let b = json!({"exception": "ValueError"});
        assert_ne!(error_id("runtime", &a), error_id("runtime", &b));
    }
}
