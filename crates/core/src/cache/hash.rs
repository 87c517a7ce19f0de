//! Cache key and credential digests.

use sha2::{Digest, Sha256};

/// Suffix appended to every robots.txt cache key.
pub const KEY_SUFFIX: &str = "-robots-txt";

/// Hex-encoded SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the cache key for a domain's robots.txt body.
///
/// The domain is lowercased before hashing so `Example.com` and
/// `example.com` share an entry.
pub fn cache_key(domain: &str) -> String {
    format!("{}{KEY_SUFFIX}", sha256_hex(&domain.to_lowercase()))
}
