//! The application's collections, wired to one backend.

use std::sync::Arc;

use devcamper_auth::User;
use devcamper_catalog::{Bootcamp, Course, Review};
use devcamper_query::Schema;

use crate::store::{DocumentCollection, InMemoryCollection, Repository};

#[derive(Clone)]
pub struct Stores {
    pub bootcamps: Repository<Bootcamp>,
    pub courses: Repository<Course>,
    pub reviews: Repository<Review>,
    pub users: Repository<User>,
}

impl Stores {
    /// Build every collection with `open`, given the collection's schema.
    pub fn with<F>(mut open: F) -> Self
    where
        F: FnMut(Schema) -> Arc<dyn DocumentCollection>,
    {
        Self {
            bootcamps: Repository::new(open(devcamper_catalog::bootcamp::SCHEMA)),
            courses: Repository::new(open(devcamper_catalog::course::SCHEMA)),
            reviews: Repository::new(open(devcamper_catalog::review::SCHEMA)),
            users: Repository::new(open(devcamper_auth::user::SCHEMA)),
        }
    }

    pub fn in_memory() -> Self {
        Self::with(|schema| Arc::new(InMemoryCollection::new(schema)))
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::with(|schema| Arc::new(crate::store::PostgresCollection::new(pool.clone(), schema)))
    }
}
