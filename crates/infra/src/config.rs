//! Configuration loading and representation.
//!
//! Values come from the process environment, after loading a `.env` file
//! when one is present.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound for minute-valued settings (ten years). Keeps durations and
/// cookie `Max-Age` seconds well inside `chrono::Duration` and `i64`.
pub const MAX_DURATION_MINUTES: i64 = 10 * 365 * 24 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expire_minutes: i64,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub file_upload_path: PathBuf,
    pub max_file_upload: usize,
    pub reset_token_ttl_minutes: i64,
    pub public_base_url: String,
    pub database_url: Option<String>,
    pub seed_file: Option<PathBuf>,
    pub geocoder_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expire_minutes: 30 * 24 * 60,
            default_page_limit: 25,
            max_page_limit: 100,
            file_upload_path: PathBuf::from("./public/uploads"),
            max_file_upload: 1_000_000,
            reset_token_ttl_minutes: 10,
            public_base_url: "http://localhost:5000".to_string(),
            database_url: None,
            seed_file: None,
            geocoder_file: None,
        }
    }
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(&get, "PORT", defaults.port)?;
        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using an insecure development secret");
                defaults.jwt_secret
            }
        };

        let config = Self {
            port,
            jwt_secret,
            jwt_expire_minutes: minutes(&get, "JWT_EXPIRE_MINUTES", defaults.jwt_expire_minutes)?,
            default_page_limit: positive(&get, "DEFAULT_PAGE_LIMIT", defaults.default_page_limit)?,
            max_page_limit: positive(&get, "MAX_PAGE_LIMIT", defaults.max_page_limit)?,
            file_upload_path: get("FILE_UPLOAD_PATH").map(PathBuf::from).unwrap_or(defaults.file_upload_path),
            max_file_upload: positive(&get, "MAX_FILE_UPLOAD", defaults.max_file_upload)?,
            reset_token_ttl_minutes: minutes(&get, "RESET_TOKEN_TTL_MINUTES", defaults.reset_token_ttl_minutes)?,
            public_base_url: get("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{port}")),
            database_url: get("DATABASE_URL"),
            seed_file: get("SEED_FILE").map(PathBuf::from),
            geocoder_file: get("GEOCODER_FILE").map(PathBuf::from),
        };

        if config.default_page_limit > config.max_page_limit {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_PAGE_LIMIT",
                value: config.default_page_limit.to_string(),
                reason: format!("exceeds MAX_PAGE_LIMIT ({})", config.max_page_limit),
            });
        }
        Ok(config)
    }

    pub fn query_options(&self) -> devcamper_query::QueryOptions {
        devcamper_query::QueryOptions {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}

fn minutes<G>(get: &G, var: &'static str, default: i64) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = positive(get, var, default)?;
    if value > MAX_DURATION_MINUTES {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: format!("must be at most {MAX_DURATION_MINUTES} minutes"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.query_options().default_limit, 25);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("JWT_SECRET", "s3cret"),
            ("MAX_PAGE_LIMIT", "50"),
            ("PUBLIC_BASE_URL", "https://api.devcamper.io/"),
            ("SEED_FILE", "_data/seed.json"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.max_page_limit, 50);
        assert_eq!(config.public_base_url, "https://api.devcamper.io");
        assert_eq!(config.seed_file, Some(PathBuf::from("_data/seed.json")));
    }

    #[test]
    fn base_url_follows_port() {
        assert_eq!(load(&[("PORT", "7000")]).unwrap().public_base_url, "http://localhost:7000");
    }

    #[test]
    fn invalid_numbers_fail() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
        assert!(load(&[("MAX_FILE_UPLOAD", "0")]).is_err());
        assert!(load(&[("DEFAULT_PAGE_LIMIT", "200")]).is_err());
    }

    #[test]
    fn durations_are_bounded() {
        let err = load(&[("JWT_EXPIRE_MINUTES", "9223372036854775807")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "JWT_EXPIRE_MINUTES", .. }));
        assert!(load(&[("RESET_TOKEN_TTL_MINUTES", "99999999999")]).is_err());
        assert!(load(&[("RESET_TOKEN_TTL_MINUTES", "0")]).is_err());

        let ten_years = MAX_DURATION_MINUTES.to_string();
        let config = load(&[("JWT_EXPIRE_MINUTES", ten_years.as_str())]).unwrap();
        assert_eq!(config.jwt_expire_minutes, MAX_DURATION_MINUTES);
    }
}
