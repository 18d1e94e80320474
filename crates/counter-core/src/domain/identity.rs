//! Privacy-preserving client identities.
//!
//! Raw network identifiers never leave this module: the service only ever
//! sees the truncated SHA-256 digest.

use std::fmt;

use sha2::{Digest, Sha256};

/// Salt appended to every identifier before hashing.
pub const IDENTITY_SALT: &str = "_1mb_salt_2024";

/// Number of digest bytes kept (rendered as twice as many hex chars).
const DIGEST_PREFIX_BYTES: usize = 8;

/// A one-way hash of a client network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityHash(String);

impl IdentityHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the rate-limit record for this identity.
    pub fn rate_limit_key(&self) -> String {
        format!("voted:{}", self.0)
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives [`IdentityHash`]es from raw identifiers.
#[derive(Debug, Clone)]
pub struct IdentityHasher {
    salt: String,
}

impl IdentityHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// Hash `identifier ++ salt` and keep the first 8 bytes as lowercase hex.
    pub fn hash(&self, identifier: &str) -> IdentityHash {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        hasher.update(self.salt.as_bytes());
        let digest = hasher.finalize();

        IdentityHash(hex::encode(&digest[..DIGEST_PREFIX_BYTES]))
    }
}

impl Default for IdentityHasher {
    fn default() -> Self {
        Self::new(IDENTITY_SALT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_sixteen_lowercase_hex_chars() {
        let hasher = IdentityHasher::default();

        for input in ["203.0.113.7", "unknown", "", "2001:db8::1", "ünïcødé"] {
            let hash = hasher.hash(input);
            assert_eq!(hash.as_str().len(), 16, "input {input:?}");
            assert!(
                hash.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            );
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = IdentityHasher::default();
        assert_eq!(hasher.hash("198.51.100.1"), hasher.hash("198.51.100.1"));
        assert_eq!(
            hasher.hash("198.51.100.1"),
            IdentityHasher::default().hash("198.51.100.1")
        );
    }

    #[test]
    fn test_distinct_identifiers_produce_distinct_hashes() {
        let hasher = IdentityHasher::default();
        let hashes: std::collections::HashSet<_> = (0..=255)
            .map(|octet| hasher.hash(&format!("10.0.0.{octet}")))
            .collect();

        assert_eq!(hashes.len(), 256);
    }

    #[test]
    fn test_salt_changes_the_digest() {
        let salted = IdentityHasher::default().hash("192.0.2.10");
        let other = IdentityHasher::new("another-salt").hash("192.0.2.10");
        assert_ne!(salted, other);
    }

    #[test]
    fn test_known_digest_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        let hash = IdentityHasher::new("").hash("abc");
        assert_eq!(hash.as_str(), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_rate_limit_key_namespace() {
        let hash = IdentityHasher::new("").hash("abc");
        assert_eq!(hash.rate_limit_key(), "voted:ba7816bf8f01cfea");
        assert!(!hash.rate_limit_key().contains("abc"));
    }
}
