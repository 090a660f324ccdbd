//! Password-reset tokens.
//!
//! The plain token goes to the user by e-mail; only its SHA-256 hex digest is
//! stored.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// A freshly generated reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub plain: String,
    pub hashed: String,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plain = hex::encode(bytes);
        let hashed = hash_reset_token(&plain);
        Self { plain, hashed }
    }
}

pub fn hash_reset_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_hash_matches_plain_token() {
        let token = ResetToken::generate();
        assert_eq!(token.plain.len(), 40);
        assert_eq!(hash_reset_token(&token.plain), token.hashed);
        assert_ne!(token.plain, token.hashed);
    }
}
