//! Device fingerprint derivation
//!
//! The fingerprint is a pure function of (device family, OS family, client
//! IP): the first 12 lowercase hex characters of a SHA-256 digest of their
//! concatenation. Brevity is traded for cryptographic strength here, and
//! collisions across distinct physical devices are an accepted limitation.

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use super::device;

/// Length of the textual fingerprint, in hex characters.
pub const FINGERPRINT_LEN: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("user agent could not be classified")]
    UnparsableUserAgent,
}

/// Derive the fingerprint for a (device family, OS family, client IP)
/// triple. Deterministic: no salt, no time dependence.
pub fn generate(device: &str, os: &str, ip: &str) -> String {
    let digest = Sha256::digest(format!("{}{}{}", device, os, ip).as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(FINGERPRINT_LEN);
    key
}

/// Recompute the fingerprint from raw request inputs, for lookups.
///
/// Fails when the user agent cannot be classified at all, letting the
/// caller treat the key as not computable and fall back to other lookup
/// strategies.
pub fn search_key(user_agent: &str, ip: &str) -> Result<String, FingerprintError> {
    let signals = device::try_parse(user_agent).ok_or(FingerprintError::UnparsableUserAgent)?;
    let key = generate(&signals.device, &signals.os, ip);
    debug!(%key, "generated search key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate("smartphone", "iPhone", "1.2.3.4");
        let b = generate("smartphone", "iPhone", "1.2.3.4");
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_shape() {
        let key = generate("pc", "Windows 10", "10.0.0.1");
        assert_eq!(key.len(), FINGERPRINT_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_search_key_matches_generate() {
        let key = search_key(IPHONE_SAFARI, "1.2.3.4").unwrap();
        let signals = super::device::parse(IPHONE_SAFARI);
        assert_eq!(key, generate(&signals.device, &signals.os, "1.2.3.4"));
    }

    #[test]
    fn test_search_key_unparseable_user_agent() {
        assert_eq!(
            search_key("", "1.2.3.4"),
            Err(FingerprintError::UnparsableUserAgent)
        );
    }
}
