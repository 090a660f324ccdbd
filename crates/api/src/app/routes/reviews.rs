use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use devcamper_catalog::{Review, ReviewInput};
use devcamper_infra::advanced_results::advanced_results;
use devcamper_infra::hooks::recompute_bootcamp_aggregates;
use devcamper_infra::store::{DocumentCollection, id_value};
use devcamper_query::{AdvancedResult, Filter};

use crate::app::dto::{self, ApiJson};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{bootcamps, pairs, parse_id, with_bootcamp};
use crate::app::services::AppServices;
use crate::authz::{REVIEWERS, require_owner, require_role};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews))
        .route("/:id", get(get_review).put(update_review).delete(delete_review))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResult>> {
    let result = advanced_results(
        services.stores.reviews.collection().as_ref(),
        pairs(&params),
        &[with_bootcamp(&services)],
        &services.query_options(),
    )
    .await?;
    Ok(Json(result))
}

/// `GET /bootcamps/:id/reviews`
pub async fn list_for_bootcamp(
    Extension(services): Extension<Arc<AppServices>>,
    Path(bootcamp_id): Path<String>,
) -> ApiResult<Response> {
    let bootcamp_id = parse_id(&bootcamp_id)?;
    let reviews = services
        .stores
        .reviews
        .find_all(Filter::new().and_eq("bootcamp", id_value(bootcamp_id)))
        .await?;
    Ok(dto::list(reviews))
}

pub async fn get_review(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let mut doc = services
        .stores
        .reviews
        .collection()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("review", id))?;
    with_bootcamp(&services).expand(std::slice::from_mut(&mut doc)).await?;
    Ok(dto::data(StatusCode::OK, Value::Object(doc)))
}

/// `POST /bootcamps/:id/reviews`
///
/// One review per user per bootcamp; a second attempt is rejected by the
/// store's unique key.
pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(bootcamp_id): Path<String>,
    ApiJson(body): ApiJson<ReviewInput>,
) -> ApiResult<Response> {
    let principal = require_role(&current, REVIEWERS)?;
    let bootcamp = bootcamps::load(&services, &bootcamp_id).await?;

    let review = body.into_review(bootcamp.id, principal.user_id, Utc::now())?;
    services.stores.reviews.insert(&review).await?;
    recompute_bootcamp_aggregates(&services.stores, bootcamp.id).await?;

    info!(review_id = %review.id, bootcamp_id = %bootcamp.id, "review created");
    Ok(dto::data(StatusCode::CREATED, review))
}

pub async fn update_review(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReviewInput>,
) -> ApiResult<Response> {
    let principal = require_role(&current, REVIEWERS)?;
    let mut review = load(&services, &id).await?;
    require_owner(&principal, review.user, &format!("update review {}", review.id))?;

    body.apply(&mut review)?;
    services.stores.reviews.save(&review).await?;
    recompute_bootcamp_aggregates(&services.stores, review.bootcamp).await?;

    info!(review_id = %review.id, "review updated");
    Ok(dto::data(StatusCode::OK, review))
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let principal = require_role(&current, REVIEWERS)?;
    let review = load(&services, &id).await?;
    require_owner(&principal, review.user, &format!("delete review {}", review.id))?;

    services.stores.reviews.delete(review.id).await?;
    recompute_bootcamp_aggregates(&services.stores, review.bootcamp).await?;

    info!(review_id = %review.id, "review deleted");
    Ok(dto::empty())
}

async fn load(services: &AppServices, raw_id: &str) -> ApiResult<Review> {
    let id = parse_id(raw_id)?;
    services
        .stores
        .reviews
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("review", id))
}
