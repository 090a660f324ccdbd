//! HS256 token signing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use devcamper_core::DocumentId;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Verifies a bearer token and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Signs tokens for a user.
pub trait JwtIssuer: Send + Sync {
    fn issue(&self, sub: DocumentId, now: DateTime<Utc>) -> Result<String, TokenError>;
}

/// Shared-secret HS256 implementation of both sides.
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl JwtIssuer for Hs256Jwt {
    fn issue(&self, sub: DocumentId, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = JwtClaims::new(sub, now, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        // Time window is checked against `now` below, not the system clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}
