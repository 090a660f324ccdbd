//! User administration. Every route here sits behind
//! [`crate::middleware::admin_only`].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::Utc;
use tracing::info;

use devcamper_auth::{NewUser, User, UserChanges};
use devcamper_infra::advanced_results::advanced_results;
use devcamper_query::AdvancedResult;

use crate::app::dto::{self, ApiJson};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{pairs, parse_id};
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResult>> {
    let result = advanced_results(
        services.stores.users.collection().as_ref(),
        pairs(&params),
        &[],
        &services.query_options(),
    )
    .await?;
    Ok(Json(result))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let user = load(&services, &id).await?;
    Ok(dto::data(StatusCode::OK, dto::public_user(&user)?))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    admin: CurrentUser,
    ApiJson(body): ApiJson<NewUser>,
) -> ApiResult<Response> {
    let user = body.into_user(true, Utc::now())?;
    services.stores.users.insert(&user).await?;
    info!(user_id = %user.id, admin_id = %admin.user.id, "user created");
    Ok(dto::data(StatusCode::CREATED, dto::public_user(&user)?))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    admin: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UserChanges>,
) -> ApiResult<Response> {
    let mut user = load(&services, &id).await?;
    body.apply(&mut user)?;
    services.stores.users.save(&user).await?;
    info!(user_id = %user.id, admin_id = %admin.user.id, "user updated");
    Ok(dto::data(StatusCode::OK, dto::public_user(&user)?))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    admin: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let user = load(&services, &id).await?;
    services.stores.users.delete(user.id).await?;
    info!(user_id = %user.id, admin_id = %admin.user.id, "user deleted");
    Ok(dto::empty())
}

async fn load(services: &AppServices, raw_id: &str) -> ApiResult<User> {
    let id = parse_id(raw_id)?;
    services
        .stores
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", id))
}
