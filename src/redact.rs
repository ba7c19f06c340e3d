use sha2::{Digest, Sha256};

const PREFIX_LEN: usize = 8;

/// Mask an identifier (login, email) for debug logs.
///
/// Returns a short SHA-256 prefix: stable within and across runs so log lines
/// can be correlated, but not reversible to the original value.
pub fn redact(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(PREFIX_LEN);
    encoded
}
