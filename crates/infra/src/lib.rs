//! Infrastructure layer: document stores, config, external services.

pub mod advanced_results;
pub mod config;
pub mod hooks;
pub mod seed;
pub mod stores;

/// Document store adapters (in-memory, Postgres) and the typed repository.
pub mod store;

/// External service clients/adapters.
pub mod external;

pub use advanced_results::{AdvancedResultsError, Populate, advanced_results};
pub use config::{AppConfig, ConfigError};
pub use stores::Stores;
