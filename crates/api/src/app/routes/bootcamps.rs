use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, put},
};
use chrono::Utc;
use tracing::{info, warn};

use devcamper_catalog::{Bootcamp, BootcampInput, GeoPoint, Location, check_upload, photo_file_name};
use devcamper_core::DomainError;
use devcamper_infra::advanced_results::{Populate, advanced_results};
use devcamper_infra::hooks::delete_bootcamp_cascade;
use devcamper_infra::store::id_value;
use devcamper_infra::AppConfig;
use devcamper_query::{AdvancedResult, Filter};

use crate::app::dto::{self, ApiJson};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::{courses, pairs, parse_id, reviews};
use crate::app::services::AppServices;
use crate::authz::{PUBLISHERS, require_owner, require_role};
use crate::context::CurrentUser;

/// Multipart framing around the file itself.
const UPLOAD_OVERHEAD: usize = 16 * 1024;

pub fn router(config: &AppConfig) -> Router {
    Router::new()
        .route("/", get(list_bootcamps).post(create_bootcamp))
        .route("/radius/:zipcode/:distance", get(bootcamps_in_radius))
        .route("/:id", get(get_bootcamp).put(update_bootcamp).delete(delete_bootcamp))
        .route(
            "/:id/photo",
            put(upload_photo).layer(DefaultBodyLimit::max(config.max_file_upload + UPLOAD_OVERHEAD)),
        )
        .route("/:id/courses", get(courses::list_for_bootcamp).post(courses::create_course))
        .route("/:id/reviews", get(reviews::list_for_bootcamp).post(reviews::create_review))
}

pub async fn list_bootcamps(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<AdvancedResult>> {
    let populate = [Populate::virtual_many(
        "courses",
        services.stores.courses.collection().clone(),
        "bootcamp",
        &[],
    )];
    let result = advanced_results(
        services.stores.bootcamps.collection().as_ref(),
        pairs(&params),
        &populate,
        &services.query_options(),
    )
    .await?;
    Ok(Json(result))
}

pub async fn get_bootcamp(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let bootcamp = load(&services, &id).await?;
    Ok(dto::data(StatusCode::OK, bootcamp))
}

pub async fn create_bootcamp(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    ApiJson(body): ApiJson<BootcampInput>,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;

    let mut bootcamp = body.into_bootcamp(principal.user_id, Utc::now())?;
    locate(&services, &mut bootcamp).await;

    // Publishers get one bootcamp; admins are unlimited.
    if principal.role.is_admin() {
        services.stores.bootcamps.insert(&bootcamp).await?;
    } else {
        let owned = Filter::new().and_eq("user", id_value(principal.user_id));
        if !services.stores.bootcamps.insert_unless(&bootcamp, &owned).await? {
            return Err(DomainError::conflict(format!(
                "The user with ID {} has already published a bootcamp",
                principal.user_id
            ))
            .into());
        }
    }

    info!(bootcamp_id = %bootcamp.id, user_id = %principal.user_id, "bootcamp created");
    Ok(dto::data(StatusCode::CREATED, bootcamp))
}

pub async fn update_bootcamp(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<BootcampInput>,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;
    let mut bootcamp = load(&services, &id).await?;
    require_owner(&principal, bootcamp.user, "update this bootcamp")?;

    body.apply(&mut bootcamp)?;
    if bootcamp.location.is_none() {
        locate(&services, &mut bootcamp).await;
    }
    services.stores.bootcamps.save(&bootcamp).await?;

    info!(bootcamp_id = %bootcamp.id, user_id = %principal.user_id, "bootcamp updated");
    Ok(dto::data(StatusCode::OK, bootcamp))
}

pub async fn delete_bootcamp(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;
    let bootcamp = load(&services, &id).await?;
    require_owner(&principal, bootcamp.user, "delete this bootcamp")?;

    delete_bootcamp_cascade(&services.stores, bootcamp.id).await?;

    info!(bootcamp_id = %bootcamp.id, user_id = %principal.user_id, "bootcamp deleted");
    Ok(dto::empty())
}

pub async fn bootcamps_in_radius(
    Extension(services): Extension<Arc<AppServices>>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> ApiResult<Response> {
    let miles = distance
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid distance '{distance}'")))?;

    let place = services
        .geocoder
        .geocode(&zipcode)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("No location found for zipcode {zipcode}")))?;
    let center = GeoPoint::new(place.lat, place.lng);

    let bootcamps: Vec<Bootcamp> = services
        .stores
        .bootcamps
        .find_all(Filter::new())
        .await?
        .into_iter()
        .filter(|b| b.location.as_ref().is_some_and(|loc| loc.point().within(&center, miles)))
        .collect();
    Ok(dto::list(bootcamps))
}

pub async fn upload_photo(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let principal = require_role(&current, PUBLISHERS)?;
    let mut bootcamp = load(&services, &id).await?;
    require_owner(&principal, bootcamp.user, "update this bootcamp")?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let original = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some((content_type, original, bytes));
        break;
    }
    let Some((content_type, original, bytes)) = upload else {
        return Err(ApiError::BadRequest("Please upload a file".to_string()));
    };

    check_upload(content_type.as_deref(), bytes.len(), services.config.max_file_upload)?;
    let file_name = photo_file_name(bootcamp.id, &original);
    services.photos.save(&file_name, &bytes).await?;

    bootcamp.photo = file_name.clone();
    services.stores.bootcamps.save(&bootcamp).await?;

    info!(bootcamp_id = %bootcamp.id, photo = %file_name, "bootcamp photo uploaded");
    Ok(dto::data(StatusCode::OK, file_name))
}

pub(crate) async fn load(services: &AppServices, raw_id: &str) -> ApiResult<Bootcamp> {
    let id = parse_id(raw_id)?;
    services
        .stores
        .bootcamps
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("bootcamp", id))
}

/// Resolve the bootcamp's address; an unresolvable address leaves the
/// location empty.
async fn locate(services: &AppServices, bootcamp: &mut Bootcamp) {
    match services.geocoder.geocode(&bootcamp.address).await {
        Ok(Some(place)) => bootcamp.location = Some(Location::from(place)),
        Ok(None) => {}
        Err(err) => warn!(error = %err, address = %bootcamp.address, "geocoding failed"),
    }
}
