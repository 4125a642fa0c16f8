//! Password hashing module
//!
//! bcrypt hashing and verification. Each hash carries its own random salt
//! and cost factor, so stored hashes stay verifiable after the configured
//! cost changes.

use anyhow::{Context, Result};

/// Cost factor used for stored passwords
pub const DEFAULT_COST: u32 = 10;

/// Hash a password with bcrypt at the given cost.
///
/// # Example
///
/// ```ignore
/// use feder::services::password::{hash_password, DEFAULT_COST};
///
/// let hash = hash_password("my_secure_password", DEFAULT_COST)?;
/// assert!(hash.starts_with("$2b$10$"));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("Password hashing failed")
}

/// Verify a password against a stored hash.
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash is
/// malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Password verification error")
}
