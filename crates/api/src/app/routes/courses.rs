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

use devcamper_catalog::{Course, CourseInput};
use devcamper_infra::advanced_results::advanced_results;
use devcamper_infra::hooks::recompute_bootcamp_aggregates;
use devcamper_infra::store::{DocumentCollection, id_value};
use devcamper_query::{AdvancedResult, Filter};

use crate::app::dto::{self, ApiJson};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{bootcamps, pairs, parse_id, with_bootcamp};
use crate::app::services::AppServices;
use crate::authz::{PUBLISHERS, require_owner, require_role};
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_courses))
        .route("/:id", get(get_course).put(update_course).delete(delete_course))
}

pub async fn list_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResult>> {
    let result = advanced_results(
        services.stores.courses.collection().as_ref(),
        pairs(&params),
        &[with_bootcamp(&services)],
        &services.query_options(),
    )
    .await?;
    Ok(Json(result))
}

/// `GET /bootcamps/:id/courses`
pub async fn list_for_bootcamp(
    Extension(services): Extension<Arc<AppServices>>,
    Path(bootcamp_id): Path<String>,
) -> ApiResult<Response> {
    let bootcamp_id = parse_id(&bootcamp_id)?;
    let courses = services
        .stores
        .courses
        .find_all(Filter::new().and_eq("bootcamp", id_value(bootcamp_id)))
        .await?;
    Ok(dto::list(courses))
}

pub async fn get_course(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let mut doc = services
        .stores
        .courses
        .collection()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("course", id))?;
    with_bootcamp(&services).expand(std::slice::from_mut(&mut doc)).await?;
    Ok(dto::data(StatusCode::OK, Value::Object(doc)))
}

/// `POST /bootcamps/:id/courses`
pub async fn create_course(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(bootcamp_id): Path<String>,
    ApiJson(body): ApiJson<CourseInput>,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;
    let bootcamp = bootcamps::load(&services, &bootcamp_id).await?;
    require_owner(&principal, bootcamp.user, &format!("add a course to bootcamp {}", bootcamp.id))?;

    let course = body.into_course(bootcamp.id, principal.user_id, Utc::now())?;
    services.stores.courses.insert(&course).await?;
    recompute_bootcamp_aggregates(&services.stores, bootcamp.id).await?;

    info!(course_id = %course.id, bootcamp_id = %bootcamp.id, "course created");
    Ok(dto::data(StatusCode::CREATED, course))
}

pub async fn update_course(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CourseInput>,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;
    let mut course = load(&services, &id).await?;
    require_owner(&principal, course.user, &format!("update course {}", course.id))?;

    body.apply(&mut course)?;
    services.stores.courses.save(&course).await?;
    recompute_bootcamp_aggregates(&services.stores, course.bootcamp).await?;

    info!(course_id = %course.id, "course updated");
    Ok(dto::data(StatusCode::OK, course))
}

pub async fn delete_course(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;
    let course = load(&services, &id).await?;
    require_owner(&principal, course.user, &format!("delete course {}", course.id))?;

    services.stores.courses.delete(course.id).await?;
    recompute_bootcamp_aggregates(&services.stores, course.bootcamp).await?;

    info!(course_id = %course.id, "course deleted");
    Ok(dto::empty())
}

async fn load(services: &AppServices, raw_id: &str) -> ApiResult<Course> {
    let id = parse_id(raw_id)?;
    services
        .stores
        .courses
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("course", id))
}
