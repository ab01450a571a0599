//! Hashing utilities for configuration fingerprints.
//!
//! Fingerprints are cache keys, not security material: a truncated MD5
//! digest is enough to detect sdkconfig drift between builds. The scheme
//! is unversioned, so any change here invalidates previously recorded
//! fingerprints and forces a reinstall on the next run.

use md5::{Digest, Md5};

/// Number of hex characters kept in a short fingerprint.
pub const FINGERPRINT_LEN: usize = 16;

/// Compute the MD5 hash of a byte slice as a lowercase hex string.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the MD5 hash of a string.
pub fn md5_str(s: &str) -> String {
    md5_hex(s.as_bytes())
}

/// Compute a short fingerprint: the first 16 hex characters of the MD5
/// digest of `s`.
pub fn short_fingerprint(s: &str) -> String {
    let mut digest = md5_str(s);
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Check whether a string looks like a short fingerprint (16 hex
/// characters). Used to sanity-check recorded marker lines.
pub fn is_short_fingerprint(s: &str) -> bool {
    s.len() == FINGERPRINT_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
