//! Shared application state handed to every handler.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};

use devcamper_auth::{Hs256Jwt, JwtIssuer, JwtValidator, User};
use devcamper_infra::config::MAX_DURATION_MINUTES;
use devcamper_infra::AppConfig;
use devcamper_infra::Stores;
use devcamper_infra::external::{Geocoder, LocalPhotoStore, LogMailer, Mailer, PhotoStore, StaticGeocoder};
use devcamper_infra::seed::{self, SeedFile};
use devcamper_query::QueryOptions;

use crate::app::errors::{ApiError, ApiResult, NOT_AUTHORIZED};

pub struct AppServices {
    pub config: AppConfig,
    pub stores: Stores,
    pub jwt_issuer: Arc<dyn JwtIssuer>,
    pub jwt_validator: Arc<dyn JwtValidator>,
    pub geocoder: Arc<dyn Geocoder>,
    pub mailer: Arc<dyn Mailer>,
    pub photos: Arc<dyn PhotoStore>,
}

/// Configs built in code skip env validation; clamp like `from_env` bounds.
fn bounded_minutes(minutes: i64) -> Duration {
    Duration::minutes(minutes.clamp(1, MAX_DURATION_MINUTES))
}

impl AppServices {
    /// Services over `stores` with the default collaborators: no geocoder
    /// entries, log-only mail, photos under `FILE_UPLOAD_PATH`.
    pub fn new(config: AppConfig, stores: Stores) -> Self {
        let jwt = Arc::new(Hs256Jwt::new(
            config.jwt_secret.as_bytes(),
            bounded_minutes(config.jwt_expire_minutes),
        ));
        let photos = Arc::new(LocalPhotoStore::new(config.file_upload_path.clone()));
        Self {
            stores,
            jwt_issuer: jwt.clone(),
            jwt_validator: jwt,
            geocoder: Arc::new(StaticGeocoder::default()),
            mailer: Arc::new(LogMailer),
            photos,
            config,
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        self.config.query_options()
    }

    pub fn reset_token_ttl(&self) -> Duration {
        bounded_minutes(self.config.reset_token_ttl_minutes)
    }

    pub fn issue_token(&self, user: &User) -> ApiResult<String> {
        Ok(self.jwt_issuer.issue(user.id, Utc::now())?)
    }

    /// Validate a bearer token and load the user it names.
    pub async fn authenticate(&self, token: &str) -> ApiResult<User> {
        let claims = self.jwt_validator.validate(token, Utc::now())?;
        self.stores
            .users
            .get(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(NOT_AUTHORIZED.to_string()))
    }
}

/// Wire every collaborator named by `config`, import seed data, and return
/// the shared state.
pub async fn build_services(config: AppConfig) -> anyhow::Result<AppServices> {
    let stores = open_stores(&config).await?;
    let mut services = AppServices::new(config, stores);

    if let Some(path) = &services.config.geocoder_file {
        let geocoder = StaticGeocoder::from_file(path)
            .with_context(|| format!("loading geocoder table {}", path.display()))?;
        tracing::info!(entries = geocoder.len(), "geocoder table loaded");
        services.geocoder = Arc::new(geocoder);
    }

    if let Some(path) = &services.config.seed_file {
        let file = SeedFile::from_path(path).with_context(|| format!("reading seed file {}", path.display()))?;
        seed::import(&services.stores, services.geocoder.as_ref(), file).await?;
    }

    Ok(services)
}

#[cfg(feature = "postgres")]
async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    let Some(url) = &config.database_url else {
        return Ok(Stores::in_memory());
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("connecting to DATABASE_URL")?;
    devcamper_infra::store::postgres::migrate(&pool).await?;
    tracing::info!("using postgres document store");
    Ok(Stores::postgres(pool))
}

#[cfg(not(feature = "postgres"))]
async fn open_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using the in-memory store");
    }
    Ok(Stores::in_memory())
}
