use std::sync::Arc;

use axum::Router;

use devcamper_core::DocumentId;
use devcamper_infra::Populate;

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;
use crate::middleware;

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod system;
pub mod users;

/// Router for everything under `/api/v1`.
pub fn router(services: Arc<AppServices>) -> Router {
    let users = users::router().layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::admin_only,
    ));

    Router::new()
        .nest("/bootcamps", bootcamps::router(&services.config))
        .nest("/courses", courses::router())
        .nest("/reviews", reviews::router())
        .nest("/auth", auth::router())
        .nest("/users", users)
}

pub(crate) fn parse_id(raw: &str) -> ApiResult<DocumentId> {
    Ok(raw.parse()?)
}

/// Borrowed view of decoded query-string pairs, in request order.
pub(crate) fn pairs(params: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

/// Expand a record's `bootcamp` reference to `{id, name, description}`.
pub(crate) fn with_bootcamp(services: &AppServices) -> Populate {
    Populate::reference(
        "bootcamp",
        services.stores.bootcamps.collection().clone(),
        &["name", "description"],
    )
}
