use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use devcamper_auth::{Principal, User};

use crate::app::errors::{ApiError, NOT_AUTHORIZED};
use crate::app::services::AppServices;

/// The authenticated caller of a request.
///
/// Extracting it requires a valid `Authorization: Bearer <token>` header
/// naming an existing user; otherwise the request fails with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user.id,
            role: self.user.role,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by a router-level guard.
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }
        let services = parts
            .extensions
            .get::<Arc<AppServices>>()
            .cloned()
            .ok_or_else(|| ApiError::internal("AppServices extension missing"))?;
        resolve(&services, &parts.headers).await
    }
}

pub async fn resolve(services: &AppServices, headers: &HeaderMap) -> Result<CurrentUser, ApiError> {
    let token = extract_bearer(headers).ok_or_else(|| ApiError::Unauthorized(NOT_AUTHORIZED.to_string()))?;
    let user = services.authenticate(token).await?;
    Ok(CurrentUser { user })
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
