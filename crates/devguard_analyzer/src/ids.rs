//! Deterministic content-addressed ids.
//!
//! Grounded on the original analyzer's `_generate_id` (md5 of
//! `path:type:name:line`, truncated to 16 hex chars); upgraded to sha256
//! since the rest of this system (error fingerprints) already commits to it
//! and there is no reason to carry two hash algorithms.

use sha2::{Digest, Sha256};

pub fn entity_id(file_path: &str, kind: &str, name: &str, line_start: i64) -> String {
    let key = format!("{file_path}:{kind}:{name}:{line_start}");
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..8])
}

pub fn relation_id(
    file_path: &str,
    kind: &str,
    source_id: &str,
    target: &str,
    line: i64,
) -> String {
    let key = format!("{file_path}:{kind}:{source_id}:{target}:{line}");
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_is_deterministic_and_16_hex_chars() {
        let a = entity_id("mod.py", "function", "foo", 10);
        let b = entity_id("mod.py", "function", "foo", 10);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn entity_id_changes_with_line() {
        let a = entity_id("mod.py", "function", "foo", 10);
        let b = entity_id("mod.py", "function", "foo", 11);
        assert_ne!(a, b);
    }
}
