//! Startup data import.
//!
//! A seed file is a JSON object with optional `users`, `bootcamps`,
//! `courses` and `reviews` arrays. Records may carry a fixed `id` so
//! later records can reference earlier ones.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use devcamper_auth::{NewUser, Role};
use devcamper_catalog::{BootcampInput, CourseInput, Location, ReviewInput};
use devcamper_core::{DocumentId, DomainError};

use crate::external::Geocoder;
use crate::hooks::recompute_bootcamp_aggregates;
use crate::store::StoreError;
use crate::stores::Stores;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("seed record {collection}[{index}] is invalid: {source}")]
    Invalid {
        collection: &'static str,
        index: usize,
        source: DomainError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub bootcamps: Vec<SeedBootcamp>,
    pub courses: Vec<SeedCourse>,
    pub reviews: Vec<SeedReview>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub id: Option<DocumentId>,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct SeedBootcamp {
    pub id: Option<DocumentId>,
    pub user: DocumentId,
    #[serde(flatten)]
    pub input: BootcampInput,
}

#[derive(Debug, Deserialize)]
pub struct SeedCourse {
    pub id: Option<DocumentId>,
    pub bootcamp: DocumentId,
    pub user: DocumentId,
    #[serde(flatten)]
    pub input: CourseInput,
}

#[derive(Debug, Deserialize)]
pub struct SeedReview {
    pub id: Option<DocumentId>,
    pub bootcamp: DocumentId,
    pub user: DocumentId,
    #[serde(flatten)]
    pub input: ReviewInput,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

impl SeedFile {
    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Insert every record of `seed`, then refresh bootcamp aggregates.
#[instrument(skip_all, err)]
pub async fn import(stores: &Stores, geocoder: &dyn Geocoder, seed: SeedFile) -> Result<SeedReport, SeedError> {
    let now = Utc::now();
    let mut report = SeedReport::default();

    for (index, record) in seed.users.into_iter().enumerate() {
        let new_user = NewUser {
            name: record.name,
            email: record.email,
            password: record.password,
            role: record.role,
        };
        let mut user = new_user.into_user(true, now).map_err(invalid("users", index))?;
        if let Some(id) = record.id {
            user.id = id;
        }
        stores.users.insert(&user).await?;
        report.users += 1;
    }

    for (index, record) in seed.bootcamps.into_iter().enumerate() {
        let mut bootcamp = record
            .input
            .into_bootcamp(record.user, now)
            .map_err(invalid("bootcamps", index))?;
        if let Some(id) = record.id {
            bootcamp.id = id;
        }
        match geocoder.geocode(&bootcamp.address).await {
            Ok(Some(place)) => bootcamp.location = Some(Location::from(place)),
            Ok(None) => {}
            Err(err) => warn!(error = %err, address = %bootcamp.address, "geocoding failed during seed"),
        }
        stores.bootcamps.insert(&bootcamp).await?;
        report.bootcamps += 1;
    }

    let mut touched = BTreeSet::new();
    for (index, record) in seed.courses.into_iter().enumerate() {
        let mut course = record
            .input
            .into_course(record.bootcamp, record.user, now)
            .map_err(invalid("courses", index))?;
        if let Some(id) = record.id {
            course.id = id;
        }
        stores.courses.insert(&course).await?;
        touched.insert(course.bootcamp);
        report.courses += 1;
    }

    for (index, record) in seed.reviews.into_iter().enumerate() {
        let mut review = record
            .input
            .into_review(record.bootcamp, record.user, now)
            .map_err(invalid("reviews", index))?;
        if let Some(id) = record.id {
            review.id = id;
        }
        stores.reviews.insert(&review).await?;
        touched.insert(review.bootcamp);
        report.reviews += 1;
    }

    for bootcamp in touched {
        recompute_bootcamp_aggregates(stores, bootcamp).await?;
    }

    info!(?report, "seed data imported");
    Ok(report)
}

fn invalid(collection: &'static str, index: usize) -> impl Fn(DomainError) -> SeedError {
    move |source| SeedError::Invalid {
        collection,
        index,
        source,
    }
}
