//! Password hashing

use crate::error::Result;

/// Default bcrypt work factor
pub const DEFAULT_COST: u32 = 12;

/// Hash a plaintext password with bcrypt.
///
/// The plaintext is never logged or stored.
pub fn hash(plaintext: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(plaintext, cost)?)
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Returns false for any mismatch, including a malformed stored hash.
pub fn verify(plaintext: &str, stored_hash: &str) -> bool {
    bcrypt::verify(plaintext, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the tests fast; production uses DEFAULT_COST.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash("Secret123", TEST_COST).unwrap();
        assert!(verify("Secret123", &hashed));
        assert!(!verify("wrong", &hashed));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash("Secret123", TEST_COST).unwrap();
        let b = hash("Secret123", TEST_COST).unwrap();
        assert_ne!(a, b);
        assert!(verify("Secret123", &a));
        assert!(verify("Secret123", &b));
    }

    #[test]
    fn test_verify_malformed_hash_is_false_not_error() {
        assert!(!verify("Secret123", "not-a-bcrypt-hash"));
        assert!(!verify("Secret123", ""));
    }
}
