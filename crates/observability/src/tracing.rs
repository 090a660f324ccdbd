//! Tracing/logging initialization.
//!
//! `RUST_LOG` overrides the default directive. `LOG_FORMAT=pretty` switches
//! from JSON lines to human-readable output for local runs.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => Self::Pretty,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Used when `RUST_LOG` is unset or unparsable.
    pub default_directive: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            format: LogFormat::from_env(),
        }
    }
}

impl LogSettings {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn init(settings: LogSettings) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    match settings.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Pretty => builder.pretty().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_noop() {
        let settings = LogSettings {
            default_directive: "warn".into(),
            format: LogFormat::Json,
        };
        init(settings.clone());
        assert!(!init(settings));
    }
}
