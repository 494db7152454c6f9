//! SHA-256 certificate fingerprints via `ring::digest`.

use ring::digest::{digest, SHA256};

/// SHA-256 of DER bytes, lowercase hex.
#[must_use]
pub fn sha256_fingerprint(der: &[u8]) -> String {
    hex::encode(digest(&SHA256, der).as_ref())
}

/// Colon-separated uppercase form (`AB:CD:...`) as printed by `openssl x509 -fingerprint`.
#[must_use]
pub fn colon_fingerprint(der: &[u8]) -> String {
    digest(&SHA256, der)
        .as_ref()
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_fingerprint() {
        assert_eq!(
            sha256_fingerprint(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_colon_fingerprint() {
        let fp = colon_fingerprint(b"hello world");
        assert!(fp.starts_with("B9:4D:27:B9"));
        assert_eq!(fp.len(), 32 * 3 - 1);
    }
}
