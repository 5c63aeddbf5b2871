// core/fingerprint.rs
//
// Content fingerprinting for ingested bytes: a SHA-256 hex digest used both
// as the LogFile dedup key and, truncated to 8 characters, embedded in the
// stored filename.

use sha2::{Digest, Sha256};

/// Full hex-encoded SHA-256 digest of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Build the stored filename `YYYYMMDD_HHMMSS_<hash8>_<original>` used when
/// writing an ingested artifact to the upload directory.
pub fn stored_filename(
    ingested_at: chrono::NaiveDateTime,
    hash: &str,
    original_filename: &str,
) -> String {
    let hash8 = &hash[..hash.len().min(8)];
    format!(
        "{}_{hash8}_{original_filename}",
        ingested_at.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let bytes = b"some log content";
        assert_eq!(fingerprint(bytes), fingerprint(bytes));
    }

    #[test]
    fn fingerprint_differs_for_different_content() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }

    #[test]
    fn stored_filename_embeds_timestamp_and_hash_prefix() {
        let ts = chrono::NaiveDateTime::parse_from_str("2024-01-28 10:30:45", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let hash = fingerprint(b"content");
        let name = stored_filename(ts, &hash, "app.log");
        assert!(name.starts_with("20240128_103045_"));
        assert!(name.ends_with("_app.log"));
        assert!(name.contains(&hash[..8]));
    }
}
