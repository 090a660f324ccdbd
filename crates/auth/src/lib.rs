//! `devcamper-auth`: authentication and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod reset;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, Principal, authorize, ensure_owner_or_admin};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtIssuer, JwtValidator, TokenError};
pub use roles::Role;
pub use user::{NewUser, User, UserChanges};
pub use reset::ResetToken;
