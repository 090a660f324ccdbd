use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};

use devcamper_auth::Role;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require_role;
use crate::context;

/// Router-level guard: authenticate the caller and require the admin role.
/// The resolved [`context::CurrentUser`] is left in the request extensions.
pub async fn admin_only(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let current = context::resolve(&services, req.headers()).await?;
    require_role(&current, &[Role::Admin])?;
    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}
