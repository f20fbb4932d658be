//! Small shared utilities

use sha2::{Digest, Sha256};

/// Default TTL in hours when the configured value is unusable
pub const DEFAULT_TTL_HOURS: u32 = 6;

/// Clamp a configured TTL to a sane range (1 hour to 1 week)
pub fn clamp_ttl_hours(value: f64) -> u32 {
    if !value.is_finite() {
        return DEFAULT_TTL_HOURS;
    }
    (value.floor() as i64).clamp(1, 168) as u32
}

/// Compute the lowercase hex SHA-256 digest of a byte slice
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
