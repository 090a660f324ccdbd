//! Runs against a live database when `TEST_DATABASE_URL` is set:
//!
//! ```text
//! TEST_DATABASE_URL=postgres://localhost/devcamper_test cargo test -p devcamper-infra --features postgres
//! ```
#![cfg(feature = "postgres")]

use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;

use devcamper_core::DocumentId;
use devcamper_infra::store::postgres::migrate;
use devcamper_infra::store::{DocumentCollection, PostgresCollection};
use devcamper_query::{Document, Filter, ListQuery, QueryOptions, Schema};

const CAMPS: Schema = Schema {
    collection: "timestamp_ordering_camps",
    fields: &["name", "createdAt"],
    hidden: &[],
    unique: &[],
};

async fn collection() -> Option<PostgresCollection> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    migrate(&pool).await.expect("migrate");
    let camps = PostgresCollection::new(pool, CAMPS);
    camps.delete_many(&Filter::new()).await.expect("reset collection");
    Some(camps)
}

fn camp(name: &str) -> Document {
    json!({ "id": DocumentId::new().to_string(), "name": name })
        .as_object()
        .cloned()
        .unwrap()
}

async fn names(camps: &PostgresCollection, params: &[(&str, &str)]) -> Vec<String> {
    let query = ListQuery::parse(params.iter().copied(), &CAMPS, &QueryOptions::default()).unwrap();
    camps
        .find(&query.to_find())
        .await
        .expect("listing must not fail on date-like names")
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn date_like_names_sort_and_filter_without_errors() {
    let Some(camps) = collection().await else {
        return;
    };
    for name in [
        "2024-01-01T10:00 Coding Camp",
        "2024-99-99T99:99:99Z",
        "Alpha",
        "2024-01-01T12:00:00+05:00",
        "2024-01-01T08:00:00Z",
    ] {
        camps.insert(camp(name)).await.unwrap();
    }

    let sorted = names(&camps, &[("sort", "name")]).await;
    assert_eq!(sorted.len(), 5);
    // 12:00+05:00 is 07:00Z, so it comes before 08:00Z despite sorting later as text.
    let pos = |n: &str| sorted.iter().position(|s| s == n).unwrap();
    assert!(pos("2024-01-01T12:00:00+05:00") < pos("2024-01-01T08:00:00Z"));

    let later = names(&camps, &[("name[gte]", "2024-01-01T07:30:00Z"), ("sort", "name")]).await;
    assert!(later.contains(&"2024-01-01T08:00:00Z".to_string()));
    assert!(!later.contains(&"2024-01-01T12:00:00+05:00".to_string()));

    let count = camps.count(&Filter::new().and_eq("name", Value::from("Alpha"))).await.unwrap();
    assert_eq!(count, 1);
}
