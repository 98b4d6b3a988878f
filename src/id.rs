//! Identifier utilities for dealflow
//!
//! Evidence identifiers are content-addressed so that re-running the same
//! analysis over the same signals yields the same ids.

use sha2::{Digest, Sha256};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate an evidence id from the source url and snippet
///
/// Format: `ev_{first 4 bytes of sha256 as hex}`
/// Example: `ev_1a2b3c4d`
pub fn evidence_id(url: &str, snippet: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0u8]);
    hasher.update(snippet.as_bytes());
    let digest = hasher.finalize();
    format!("ev_{}", hex::encode(&digest[..4]))
}

/// Generate a run id
///
/// Format: `run-{timestamp_ms}-{hash_suffix}`
pub fn run_id(seed: &str) -> String {
    let timestamp = now_ms();
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_be_bytes());
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    format!("run-{}-{}", timestamp, hex::encode(&digest[..2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_id_format() {
        let id = evidence_id("https://example.com", "snippet");
        assert!(id.starts_with("ev_"));
        assert_eq!(id.len(), 3 + 8);
    }

    #[test]
    fn test_evidence_id_deterministic() {
        assert_eq!(evidence_id("https://a.com", "x"), evidence_id("https://a.com", "x"));
        assert_ne!(evidence_id("https://a.com", "x"), evidence_id("https://a.com", "y"));
    }

    #[test]
    fn test_evidence_id_separates_fields() {
        assert_ne!(evidence_id("ab", "c"), evidence_id("a", "bc"));
    }

    #[test]
    fn test_run_id_format() {
        let id = run_id("startups.json");
        assert!(id.starts_with("run-"));
        assert_eq!(id.split('-').count(), 3);
    }

    #[test]
    fn test_now_ms_returns_reasonable_timestamp() {
        // After 2024-01-01
        assert!(now_ms() > 1_704_067_200_000);
    }
}
