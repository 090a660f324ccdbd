use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use devcamper_auth::User;
use devcamper_infra::store::to_document;
use devcamper_query::projection::strip_hidden;

use crate::app::errors::{ApiError, ApiResult};

// -------------------------
// Request DTOs
// -------------------------

/// `Json<T>` whose rejections (bad syntax, wrong field types, missing
/// content type) answer with the `{ success: false, error }` body and 400.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

// -------------------------
// Response helpers
// -------------------------

/// `{ success: true, data }`
pub fn data<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(json!({ "success": true, "data": value }))).into_response()
}

/// `{ success: true, count, data }` for unpaginated lists.
pub fn list<T: Serialize>(items: Vec<T>) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "count": items.len(), "data": items })),
    )
        .into_response()
}

pub fn empty() -> Response {
    data(StatusCode::OK, json!({}))
}

/// `{ success: true, token }` plus an http-only `token` cookie.
pub fn token(token: String, max_age_secs: i64) -> Response {
    let cookie = format!("token={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "token": token })),
    )
        .into_response()
}

pub fn clear_token() -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, "token=none; Path=/; HttpOnly; Max-Age=10".to_string())],
        Json(json!({ "success": true, "data": {} })),
    )
        .into_response()
}

/// A user as returned to clients: credentials removed.
pub fn public_user(user: &User) -> ApiResult<Value> {
    let doc = to_document(user)?;
    Ok(Value::Object(strip_hidden(doc, &devcamper_auth::user::SCHEMA)))
}
