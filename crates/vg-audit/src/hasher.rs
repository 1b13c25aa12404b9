// hasher.rs — SHA-256 helpers for the audit hash chain.
//
// Digests are 64-character lowercase hex strings so they embed cleanly in
// JSONL records.

use sha2::{Digest, Sha256};

/// Hash a serialized audit line.
pub fn hash_line(line: &str) -> String {
    let digest = Sha256::digest(line.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_has_known_digest() {
        assert_eq!(
            hash_line(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn different_lines_differ() {
        let a = hash_line(r#"{"event_type":"paused"}"#);
        let b = hash_line(r#"{"event_type":"unpaused"}"#);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
