//! Account endpoints: registration, login, profile and password flows.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use devcamper_auth::reset::hash_reset_token;
use devcamper_auth::user::invalid_credentials;
use devcamper_auth::{NewUser, User, UserChanges};
use devcamper_infra::external::EmailMessage;
use devcamper_query::Filter;

use crate::app::dto::{self, ApiJson};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/me", get(me))
        .route("/forgotpassword", post(forgot_password))
        .route("/resetpassword/:resettoken", put(reset_password))
        .route("/updatedetail", put(update_details))
        .route("/updatepassword", put(update_password))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewUser>,
) -> ApiResult<Response> {
    let user = body.into_user(false, Utc::now())?;
    services.stores.users.insert(&user).await?;
    info!(user_id = %user.id, role = %user.role, "user registered");
    token_response(&services, &user)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> ApiResult<Response> {
    let (Some(email), Some(password)) = (
        body.email.filter(|e| !e.trim().is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Please provide an email and password".to_string()));
    };

    let user = find_by_email(&services, &email)
        .await?
        .filter(|user| user.matches_password(&password))
        .ok_or_else(invalid_credentials)?;
    token_response(&services, &user)
}

pub async fn logout() -> Response {
    dto::clear_token()
}

pub async fn me(current: CurrentUser) -> ApiResult<Response> {
    Ok(dto::data(StatusCode::OK, dto::public_user(&current.user)?))
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::ForgotPasswordRequest>,
) -> ApiResult<Response> {
    let mut user = find_by_email(&services, &body.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("There is no user with that email".to_string()))?;

    let token = user.issue_reset_token(Utc::now(), services.reset_token_ttl());
    services.stores.users.save(&user).await?;

    let reset_url = format!("{}/api/v1/auth/resetpassword/{token}", services.config.public_base_url);
    let message = EmailMessage {
        to: user.email.clone(),
        subject: "Password reset token".to_string(),
        body: format!(
            "You are receiving this email because you (or someone else) has requested the reset of a password. \
             Please make a PUT request to: \n\n {reset_url}"
        ),
    };

    if let Err(err) = services.mailer.send(message).await {
        warn!(user_id = %user.id, error = %err, "reset email failed");
        user.clear_reset_token();
        services.stores.users.save(&user).await?;
        return Err(ApiError::Internal {
            message: "Email could not be sent",
            detail: err.to_string(),
        });
    }

    info!(user_id = %user.id, "password reset requested");
    Ok(dto::data(StatusCode::OK, "Email sent"))
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Path(reset_token): Path<String>,
    ApiJson(body): ApiJson<dto::ResetPasswordRequest>,
) -> ApiResult<Response> {
    let now = Utc::now();
    let hashed = hash_reset_token(&reset_token);
    let mut user = services
        .stores
        .users
        .find_one(Filter::new().and_eq("resetPasswordToken", Value::String(hashed)))
        .await?
        .filter(|user| user.reset_token_matches(&reset_token, now))
        .ok_or_else(|| ApiError::BadRequest("Invalid token".to_string()))?;

    user.set_password(&body.password)?;
    user.clear_reset_token();
    services.stores.users.save(&user).await?;

    info!(user_id = %user.id, "password reset");
    token_response(&services, &user)
}

pub async fn update_details(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    ApiJson(body): ApiJson<dto::UpdateDetailsRequest>,
) -> ApiResult<Response> {
    let mut user = current.user;
    UserChanges {
        name: body.name,
        email: body.email,
        role: None,
        password: None,
    }
    .apply(&mut user)?;
    services.stores.users.save(&user).await?;

    info!(user_id = %user.id, "user details updated");
    Ok(dto::data(StatusCode::OK, dto::public_user(&user)?))
}

pub async fn update_password(
    Extension(services): Extension<Arc<AppServices>>,
    current: CurrentUser,
    ApiJson(body): ApiJson<dto::UpdatePasswordRequest>,
) -> ApiResult<Response> {
    let mut user = current.user;
    if !user.matches_password(&body.current_password) {
        return Err(ApiError::Unauthorized("Password is incorrect".to_string()));
    }
    user.set_password(&body.new_password)?;
    services.stores.users.save(&user).await?;

    info!(user_id = %user.id, "password updated");
    token_response(&services, &user)
}

async fn find_by_email(services: &AppServices, email: &str) -> ApiResult<Option<User>> {
    Ok(services
        .stores
        .users
        .find_one(Filter::new().and_eq("email", Value::String(email.trim().to_string())))
        .await?)
}

fn token_response(services: &AppServices, user: &User) -> ApiResult<Response> {
    let token = services.issue_token(user)?;
    Ok(dto::token(token, services.config.jwt_expire_minutes.saturating_mul(60)))
}
