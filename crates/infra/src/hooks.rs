//! Post-write hooks.
//!
//! A bootcamp's `averageCost` and `averageRating` are derived from its
//! courses and reviews. Every course/review write calls
//! [`recompute_bootcamp_aggregates`] after the write has been applied, so
//! deleted records no longer contribute.

use tracing::{debug, instrument};

use devcamper_catalog::{average_cost, average_rating};
use devcamper_core::DocumentId;
use devcamper_query::Filter;

use crate::store::{StoreError, id_value};
use crate::stores::Stores;

#[instrument(skip(stores), err)]
pub async fn recompute_bootcamp_aggregates(stores: &Stores, bootcamp_id: DocumentId) -> Result<(), StoreError> {
    let Some(mut bootcamp) = stores.bootcamps.get(bootcamp_id).await? else {
        // Bootcamp deleted along with its children.
        return Ok(());
    };

    let of_bootcamp = Filter::new().and_eq("bootcamp", id_value(bootcamp_id));
    let tuitions: Vec<f64> = stores
        .courses
        .find_all(of_bootcamp.clone())
        .await?
        .iter()
        .map(|c| c.tuition)
        .collect();
    let ratings: Vec<f64> = stores
        .reviews
        .find_all(of_bootcamp)
        .await?
        .iter()
        .map(|r| r.rating)
        .collect();

    let cost = average_cost(&tuitions);
    let rating = average_rating(&ratings);
    if bootcamp.average_cost == cost && bootcamp.average_rating == rating {
        return Ok(());
    }

    bootcamp.average_cost = cost;
    bootcamp.average_rating = rating;
    stores.bootcamps.save(&bootcamp).await?;
    debug!(?cost, ?rating, "bootcamp aggregates updated");
    Ok(())
}

/// Delete a bootcamp and everything that references it.
#[instrument(skip(stores), err)]
pub async fn delete_bootcamp_cascade(stores: &Stores, bootcamp_id: DocumentId) -> Result<bool, StoreError> {
    let of_bootcamp = Filter::new().and_eq("bootcamp", id_value(bootcamp_id));
    let courses = stores.courses.delete_many(&of_bootcamp).await?;
    let reviews = stores.reviews.delete_many(&of_bootcamp).await?;
    let deleted = stores.bootcamps.delete(bootcamp_id).await?;
    debug!(courses, reviews, "bootcamp children removed");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use devcamper_catalog::{Bootcamp, BootcampInput, Career, Course, CourseInput, MinimumSkill, ReviewInput, Weeks};

    async fn bootcamp(stores: &Stores) -> Bootcamp {
        let b = BootcampInput {
            name: Some(format!("Bootcamp {}", DocumentId::new())),
            description: Some("d".into()),
            address: Some("Boston MA".into()),
            careers: Some(vec![Career::Business]),
            ..Default::default()
        }
        .into_bootcamp(DocumentId::new(), Utc::now())
        .unwrap();
        stores.bootcamps.insert(&b).await.unwrap();
        b
    }

    async fn course(stores: &Stores, bootcamp: DocumentId, tuition: f64) -> Course {
        let c = CourseInput {
            title: Some("c".into()),
            description: Some("d".into()),
            weeks: Some(Weeks::Count(4)),
            tuition: Some(tuition),
            minimum_skill: Some(MinimumSkill::Beginner),
            scholarship_available: None,
        }
        .into_course(bootcamp, DocumentId::new(), Utc::now())
        .unwrap();
        stores.courses.insert(&c).await.unwrap();
        recompute_bootcamp_aggregates(stores, bootcamp).await.unwrap();
        c
    }

    #[tokio::test]
    async fn average_cost_follows_course_writes() {
        let stores = Stores::in_memory();
        let b = bootcamp(&stores).await;

        let first = course(&stores, b.id, 10000.0).await;
        course(&stores, b.id, 12001.0).await;
        assert_eq!(stores.bootcamps.require(b.id).await.unwrap().average_cost, Some(11010.0));

        stores.courses.delete(first.id).await.unwrap();
        recompute_bootcamp_aggregates(&stores, b.id).await.unwrap();
        assert_eq!(stores.bootcamps.require(b.id).await.unwrap().average_cost, Some(12010.0));
    }

    #[tokio::test]
    async fn removing_last_course_clears_average() {
        let stores = Stores::in_memory();
        let b = bootcamp(&stores).await;
        let only = course(&stores, b.id, 5000.0).await;

        stores.courses.delete(only.id).await.unwrap();
        recompute_bootcamp_aggregates(&stores, b.id).await.unwrap();
        assert_eq!(stores.bootcamps.require(b.id).await.unwrap().average_cost, None);
    }

    #[tokio::test]
    async fn average_rating_is_unrounded() {
        let stores = Stores::in_memory();
        let b = bootcamp(&stores).await;
        for rating in [8.0, 9.0] {
            let r = ReviewInput {
                title: Some("t".into()),
                text: Some("x".into()),
                rating: Some(rating),
            }
            .into_review(b.id, DocumentId::new(), Utc::now())
            .unwrap();
            stores.reviews.insert(&r).await.unwrap();
        }
        recompute_bootcamp_aggregates(&stores, b.id).await.unwrap();
        assert_eq!(stores.bootcamps.require(b.id).await.unwrap().average_rating, Some(8.5));
    }

    #[tokio::test]
    async fn cascade_removes_children_only_of_that_bootcamp() {
        let stores = Stores::in_memory();
        let doomed = bootcamp(&stores).await;
        let kept = bootcamp(&stores).await;
        course(&stores, doomed.id, 1.0).await;
        course(&stores, kept.id, 1.0).await;

        assert!(delete_bootcamp_cascade(&stores, doomed.id).await.unwrap());
        assert_eq!(stores.courses.count(&Filter::new()).await.unwrap(), 1);
        assert!(stores.bootcamps.get(doomed.id).await.unwrap().is_none());
        assert!(stores.bootcamps.get(kept.id).await.unwrap().is_some());
    }
}
