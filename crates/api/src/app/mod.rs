//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: shared state (stores, JWT, geocoder, mailer, photos)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and response envelopes
//! - `errors.rs`: error classification and `{ success: false, error }` bodies

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use devcamper_infra::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router from configuration (entrypoint used by
/// `main.rs`).
pub async fn build_app(config: AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already wired services.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", routes::router(services.clone()))
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
