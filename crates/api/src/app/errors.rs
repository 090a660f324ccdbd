use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use devcamper_auth::{AuthzError, TokenError};
use devcamper_core::DomainError;
use devcamper_infra::AdvancedResultsError;
use devcamper_infra::external::PhotoError;
use devcamper_infra::store::StoreError;
use devcamper_query::QueryError;

pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Every handler failure, already classified by HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// `message` goes to the client; `detail` only to the log.
    #[error("{message}")]
    Internal { message: &'static str, detail: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            message: "Server Error",
            detail: detail.into(),
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("No {what} with the id of {id}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Internal { message, detail } = &self {
            tracing::error!(%detail, "{message}");
        }
        json_error(self.status(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": message.into(),
        })),
    )
        .into_response()
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_) | DomainError::Conflict(_) => ApiError::BadRequest(err.to_string()),
            DomainError::InvalidId(_) => ApiError::NotFound("Resource not found".to_string()),
            DomainError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            DomainError::Internal(detail) => ApiError::internal(detail),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => ApiError::NotFound(format!("Resource not found with id of {id}")),
            StoreError::Duplicate { .. } => ApiError::BadRequest("Duplicate record found".to_string()),
            StoreError::Malformed(_) | StoreError::Backend(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AdvancedResultsError> for ApiError {
    fn from(err: AdvancedResultsError) -> Self {
        match err {
            AdvancedResultsError::Query(e) => e.into(),
            AdvancedResultsError::Store(e) => e.into(),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) => ApiError::internal(err.to_string()),
            _ => ApiError::Unauthorized("Token is invalid or has expired".to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<PhotoError> for ApiError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::InvalidName(_) => ApiError::BadRequest(err.to_string()),
            PhotoError::Io(_) => ApiError::Internal {
                message: "Problem with file upload",
                detail: err.to_string(),
            },
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcamper_core::DocumentId;

    #[test]
    fn store_errors_map_to_client_statuses() {
        let dup: ApiError = StoreError::Duplicate {
            collection: "reviews".into(),
            fields: vec!["bootcamp".into(), "user".into()],
        }
        .into();
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dup.to_string(), "Duplicate record found");

        let missing: ApiError = StoreError::NotFound {
            collection: "courses".into(),
            id: DocumentId::new(),
        }
        .into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let backend: ApiError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(backend.to_string(), "Server Error");
    }

    #[test]
    fn malformed_ids_are_not_found() {
        let err: ApiError = "not-a-uuid".parse::<DocumentId>().unwrap_err().into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Resource not found");
    }

    #[test]
    fn validation_messages_are_joined() {
        let err: ApiError = DomainError::Validation(vec!["Please add a name".into(), "Please add an address".into()]).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Please add a name, Please add an address");
    }

    #[test]
    fn conflicts_are_bad_requests_with_the_bare_message() {
        let err: ApiError = DomainError::conflict("The user with ID 1 has already published a bootcamp").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "The user with ID 1 has already published a bootcamp");
    }

    #[tokio::test]
    async fn json_rejections_use_the_error_envelope() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::Request;

        use crate::app::dto::ApiJson;

        #[derive(Debug, serde::Deserialize)]
        struct Rated {
            rating: f64,
        }

        let request = |body: &'static str| {
            Request::builder()
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap()
        };

        let rating = ApiJson::<Rated>::from_request(request(r#"{"rating":7.5}"#), &()).await.unwrap();
        assert_eq!(rating.0.rating, 7.5);

        for bad in [r#"{not json"#, r#"{"rating":"high"}"#] {
            let err = ApiJson::<Rated>::from_request(request(bad), &()).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            let res = err.into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            assert_eq!(res.headers()["content-type"], "application/json");
        }
    }

    #[test]
    fn token_and_role_failures() {
        let expired: ApiError = TokenError::Claims(devcamper_auth::TokenValidationError::Expired).into();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let role: ApiError = AuthzError::RoleNotAllowed(devcamper_auth::Role::User).into();
        assert_eq!(role.status(), StatusCode::FORBIDDEN);
        assert_eq!(role.to_string(), "User role user is not authorized to access this route");
    }
}
