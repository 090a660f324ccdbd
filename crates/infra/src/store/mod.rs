//! Document store boundary.
//!
//! Collections hold JSON documents keyed by [`DocumentId`]. Query semantics
//! (filters, sort order, windowing) are defined once in `devcamper-query`;
//! every backend here must agree with them.

pub mod collection;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;

pub use collection::{DocumentCollection, StoreError, document_id};
pub use in_memory::InMemoryCollection;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCollection;
pub use repository::{Repository, from_document, id_value, to_document};
