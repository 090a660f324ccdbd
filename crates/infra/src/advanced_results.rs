//! Paginated, filtered, projected and populated collection listings.
//!
//! `advanced_results` is the single read path behind every list endpoint:
//!
//! 1. parse the raw query parameters into a [`ListQuery`]
//! 2. count the filtered records and fetch the requested page
//! 3. apply `select`, strip hidden fields, expand relations
//! 4. wrap the page in an [`AdvancedResult`] with page links

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use devcamper_query::projection::strip_hidden;
use devcamper_query::{
    AdvancedResult, Condition, Document, FieldPath, Filter, FindQuery, ID_FIELD, ListQuery, Operator,
    PaginationMeta, Projection, QueryError, QueryOptions, Scalar, SortKey,
};

use crate::store::{DocumentCollection, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdvancedResultsError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Relation expansion applied to each page record.
#[derive(Clone)]
pub enum Populate {
    /// Replace the id held in `field` with the referenced document.
    Reference {
        field: &'static str,
        target: Arc<dyn DocumentCollection>,
        select: Option<Projection>,
    },
    /// Inline every document of `target` whose `foreign_field` holds the
    /// record's id, under `as_field`.
    VirtualMany {
        as_field: &'static str,
        target: Arc<dyn DocumentCollection>,
        foreign_field: &'static str,
        select: Option<Projection>,
    },
}

impl Populate {
    pub fn reference(field: &'static str, target: Arc<dyn DocumentCollection>, select: &[&str]) -> Self {
        Self::Reference {
            field,
            target,
            select: (!select.is_empty()).then(|| Projection::of(select)),
        }
    }

    pub fn virtual_many(
        as_field: &'static str,
        target: Arc<dyn DocumentCollection>,
        foreign_field: &'static str,
        select: &[&str],
    ) -> Self {
        Self::VirtualMany {
            as_field,
            target,
            foreign_field,
            select: (!select.is_empty()).then(|| Projection::of(select)),
        }
    }

    /// Expand the relation on every record in place.
    pub async fn expand(&self, records: &mut [Document]) -> Result<(), StoreError> {
        match self {
            Populate::Reference { field, target, select } => {
                let ids: BTreeSet<String> = records
                    .iter()
                    .filter_map(|r| r.get(*field).and_then(Value::as_str).map(str::to_string))
                    .collect();
                if ids.is_empty() {
                    return Ok(());
                }
                let found = target.find(&FindQuery::filtered(id_in(ID_FIELD, ids))).await?;
                let by_id: BTreeMap<String, Document> = found
                    .into_iter()
                    .filter_map(|doc| {
                        let id = doc.get(ID_FIELD)?.as_str()?.to_string();
                        Some((id, shape(doc, target.as_ref(), select.as_ref())))
                    })
                    .collect();

                for record in records.iter_mut() {
                    let Some(Value::String(id)) = record.get(*field) else {
                        continue;
                    };
                    let expanded = by_id.get(id).cloned().map(Value::Object).unwrap_or(Value::Null);
                    record.insert(field.to_string(), expanded);
                }
            }
            Populate::VirtualMany {
                as_field,
                target,
                foreign_field,
                select,
            } => {
                let ids: BTreeSet<String> = records
                    .iter()
                    .filter_map(|r| r.get(ID_FIELD).and_then(Value::as_str).map(str::to_string))
                    .collect();
                let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
                if !ids.is_empty() {
                    let query = FindQuery {
                        sort: vec![SortKey::asc(ID_FIELD)],
                        ..FindQuery::filtered(id_in(foreign_field, ids))
                    };
                    for doc in target.find(&query).await? {
                        let Some(owner) = doc.get(*foreign_field).and_then(Value::as_str).map(str::to_string) else {
                            continue;
                        };
                        grouped
                            .entry(owner)
                            .or_default()
                            .push(Value::Object(shape(doc, target.as_ref(), select.as_ref())));
                    }
                }

                for record in records.iter_mut() {
                    let id = record.get(ID_FIELD).and_then(Value::as_str).unwrap_or_default();
                    let related = grouped.get(id).cloned().unwrap_or_default();
                    record.insert(as_field.to_string(), Value::Array(related));
                }
            }
        }
        Ok(())
    }
}

fn id_in(field: &str, ids: BTreeSet<String>) -> Filter {
    let mut filter = Filter::new();
    filter.push(Condition {
        field: FieldPath::new(field),
        op: Operator::In,
        values: ids.into_iter().map(|id| Scalar::from_value(Value::String(id))).collect(),
    });
    filter
}

fn shape(doc: Document, collection: &dyn DocumentCollection, select: Option<&Projection>) -> Document {
    let doc = strip_hidden(doc, collection.schema());
    match select {
        Some(projection) => projection.apply(&doc),
        None => doc,
    }
}

/// Parse `params` against the collection schema and run the listing.
pub async fn advanced_results<'a, I>(
    collection: &dyn DocumentCollection,
    params: I,
    populate: &[Populate],
    options: &QueryOptions,
) -> Result<AdvancedResult, AdvancedResultsError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let query = ListQuery::parse(params, collection.schema(), options)?;
    Ok(run_list_query(collection, &query, populate).await?)
}

/// Run an already parsed listing.
///
/// `total` counts the filtered records, so page links reflect the filter.
/// Count and page fetch are separate reads and may disagree under concurrent
/// writes.
pub async fn run_list_query(
    collection: &dyn DocumentCollection,
    query: &ListQuery,
    populate: &[Populate],
) -> Result<AdvancedResult, StoreError> {
    let total = collection.count(&query.filter).await?;
    let page = collection.find(&query.to_find()).await?;

    let schema = collection.schema();
    let mut records: Vec<Document> = page
        .into_iter()
        .map(|doc| {
            let doc = match &query.projection {
                Some(projection) => projection.apply(&doc),
                None => doc,
            };
            strip_hidden(doc, schema)
        })
        .collect();

    for relation in populate {
        relation.expand(&mut records).await?;
    }

    let pagination = PaginationMeta::compute(query.page, query.limit, total);
    Ok(AdvancedResult::new(
        records.into_iter().map(Value::Object).collect(),
        pagination,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCollection;
    use devcamper_query::Schema;
    use serde_json::json;

    const BOOTCAMPS: Schema = Schema {
        collection: "bootcamps",
        fields: &["name", "description", "averageCost", "housing", "createdAt"],
        hidden: &[],
        unique: &[],
    };
    const COURSES: Schema = Schema {
        collection: "courses",
        fields: &["title", "bootcamp", "createdAt"],
        hidden: &[],
        unique: &[],
    };
    const USERS: Schema = Schema {
        collection: "users",
        fields: &["name", "createdAt"],
        hidden: &["password"],
        unique: &[],
    };

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    fn ts(i: u32) -> String {
        format!("2024-01-01T00:00:{i:02}Z")
    }

    async fn seeded() -> (Arc<InMemoryCollection>, Arc<InMemoryCollection>) {
        let bootcamps = Arc::new(InMemoryCollection::new(BOOTCAMPS));
        let courses = Arc::new(InMemoryCollection::new(COURSES));
        for i in 1..=5u32 {
            bootcamps
                .insert(doc(json!({
                    "id": format!("0000000{i}-0000-7000-8000-000000000000"),
                    "name": format!("Bootcamp {i}"),
                    "description": "d",
                    "averageCost": i * 1000,
                    "housing": i % 2 == 0,
                    "createdAt": ts(i),
                })))
                .await
                .unwrap();
        }
        for (n, owner) in [(1, 1), (2, 1), (3, 4)] {
            courses
                .insert(doc(json!({
                    "id": format!("1000000{n}-0000-7000-8000-000000000000"),
                    "title": format!("Course {n}"),
                    "bootcamp": format!("0000000{owner}-0000-7000-8000-000000000000"),
                    "createdAt": ts(n),
                })))
                .await
                .unwrap();
        }
        (bootcamps, courses)
    }

    fn names(result: &AdvancedResult) -> Vec<&str> {
        result.data.iter().map(|d| d["name"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn second_page_newest_first() {
        let (bootcamps, _) = seeded().await;
        let result = advanced_results(
            bootcamps.as_ref(),
            [("limit", "2"), ("page", "2"), ("sort", "-createdAt")],
            &[],
            &QueryOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(names(&result), ["Bootcamp 3", "Bootcamp 2"]);
        assert_eq!(result.count, 2);
        assert_eq!(result.pagination.next.map(|l| l.page), Some(3));
        assert_eq!(result.pagination.prev.map(|l| l.page), Some(1));
    }

    #[tokio::test]
    async fn total_counts_the_filtered_set() {
        let (bootcamps, _) = seeded().await;
        let result = advanced_results(
            bootcamps.as_ref(),
            [("housing", "true"), ("limit", "2")],
            &[],
            &QueryOptions::default(),
        )
        .await
        .unwrap();
        // Two matches fit on one page: no `next` even though 5 records exist.
        assert_eq!(result.count, 2);
        assert_eq!(result.pagination, PaginationMeta::default());
    }

    #[tokio::test]
    async fn select_keeps_only_requested_fields_and_id() {
        let (bootcamps, _) = seeded().await;
        let result = advanced_results(
            bootcamps.as_ref(),
            [("select", "name,description"), ("averageCost[lte]", "2000")],
            &[],
            &QueryOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(result.count, 2);
        for record in &result.data {
            let mut keys: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
            keys.sort();
            assert_eq!(keys, ["description", "id", "name"]);
        }
    }

    #[tokio::test]
    async fn bad_operator_is_a_query_error() {
        let (bootcamps, _) = seeded().await;
        let err = advanced_results(
            bootcamps.as_ref(),
            [("averageCost[where]", "1")],
            &[],
            &QueryOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AdvancedResultsError::Query(_)));
    }

    #[tokio::test]
    async fn virtual_many_inlines_children() {
        let (bootcamps, courses) = seeded().await;
        let populate = [Populate::virtual_many("courses", courses.clone(), "bootcamp", &["title"])];
        let result = advanced_results(bootcamps.as_ref(), [("sort", "createdAt")], &populate, &QueryOptions::default())
            .await
            .unwrap();

        let counts: Vec<usize> = result.data.iter().map(|d| d["courses"].as_array().unwrap().len()).collect();
        assert_eq!(counts, [2, 0, 0, 1, 0]);
        assert_eq!(result.data[0]["courses"][0]["title"], "Course 1");
        assert!(result.data[0]["courses"][0].get("createdAt").is_none());
    }

    #[tokio::test]
    async fn reference_expands_or_nulls() {
        let (bootcamps, courses) = seeded().await;
        courses
            .insert(doc(json!({
                "id": "10000009-0000-7000-8000-000000000000",
                "title": "Orphan",
                "bootcamp": "09999999-0000-7000-8000-000000000000",
                "createdAt": ts(9),
            })))
            .await
            .unwrap();

        let populate = [Populate::reference("bootcamp", bootcamps.clone(), &["name", "description"])];
        let result = advanced_results(courses.as_ref(), [("sort", "createdAt")], &populate, &QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(result.data[0]["bootcamp"]["name"], "Bootcamp 1");
        assert!(result.data[0]["bootcamp"].get("averageCost").is_none());
        assert!(result.data[3]["bootcamp"].is_null());
    }

    #[tokio::test]
    async fn unselected_references_are_not_expanded() {
        let (bootcamps, courses) = seeded().await;
        let populate = [Populate::reference("bootcamp", bootcamps.clone(), &["name"])];

        let result = advanced_results(courses.as_ref(), [("select", "title")], &populate, &QueryOptions::default())
            .await
            .unwrap();
        assert!(result.data.iter().all(|d| d.get("bootcamp").is_none()));

        let result = advanced_results(
            courses.as_ref(),
            [("select", "title,bootcamp")],
            &populate,
            &QueryOptions::default(),
        )
        .await
        .unwrap();
        assert!(result.data.iter().all(|d| d["bootcamp"]["name"].is_string()));
    }

    #[tokio::test]
    async fn hidden_fields_never_leave_the_store() {
        let users = Arc::new(InMemoryCollection::new(USERS));
        users
            .insert(doc(json!({
                "id": "20000001-0000-7000-8000-000000000000",
                "name": "Ada",
                "password": "$2b$04$hashedpasswordvalue",
                "createdAt": ts(1),
            })))
            .await
            .unwrap();
        let result = advanced_results(users.as_ref(), [], &[], &QueryOptions::default()).await.unwrap();
        assert!(result.data[0].get("password").is_none());
    }
}
