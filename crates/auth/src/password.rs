//! Password hashing.
//!
//! Stored hashes are bcrypt strings (`$2b$<cost>$...`), cost
//! [`bcrypt::DEFAULT_COST`].

use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(#[from] bcrypt::BcryptError);

pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plain, bcrypt::DEFAULT_COST)?)
}

/// Check `plain` against a stored hash. Hashes bcrypt cannot parse never
/// verify.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    bcrypt::verify(plain, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash_password("123456").unwrap();
        assert!(stored.starts_with("$2b$12$"));
        assert!(verify_password("123456", &stored));
        assert!(!verify_password("1234567", &stored));
    }

    #[test]
    fn salts_differ_per_hash() {
        assert_ne!(hash_password("secret").unwrap(), hash_password("secret").unwrap());
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$00$00"));
        assert!(!verify_password("x", "$2b$12$tooshort"));
    }
}
