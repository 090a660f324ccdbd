//! `devcamper-query`: list-query building for document collections.
//!
//! Turns raw client query parameters (`select`, `sort`, `page`, `limit` and
//! field filters) into a validated [`ListQuery`], and defines how such a query
//! evaluates against JSON documents so every store backend agrees on the
//! semantics.
//!
//! Nothing in here performs IO.

pub mod error;
pub mod filter;
pub mod find;
pub mod pagination;
pub mod params;
pub mod path;
pub mod projection;
pub mod schema;
pub mod sort;
pub mod value;

pub use error::QueryError;
pub use filter::{Condition, Filter, Operator, Scalar};
pub use find::FindQuery;
pub use pagination::{AdvancedResult, PageLink, PaginationMeta};
pub use params::{ListQuery, QueryOptions};
pub use path::FieldPath;
pub use projection::Projection;
pub use schema::Schema;
pub use sort::{SortDirection, SortKey};

/// A stored record: a JSON object carrying an `id` field.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Name of the identity field every document carries.
pub const ID_FIELD: &str = "id";
