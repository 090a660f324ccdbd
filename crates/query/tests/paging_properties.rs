use devcamper_query::{Document, ListQuery, PaginationMeta, QueryOptions, Schema};
use proptest::prelude::*;
use serde_json::json;

const SCHEMA: Schema = Schema {
    collection: "bootcamps",
    fields: &["rank", "housing", "createdAt"],
    hidden: &[],
    unique: &[],
};

fn seed(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            json!({
                "id": format!("{i:04}"),
                "rank": i,
                "housing": i % 3 == 0,
                "createdAt": format!("2024-01-01T00:{:02}:{:02}Z", i / 60, i % 60),
            })
            .as_object()
            .cloned()
            .unwrap()
        })
        .collect()
}

proptest! {
    #[test]
    fn page_never_exceeds_limit_and_next_tracks_remaining(
        n in 0usize..80,
        page in 1u32..12,
        limit in 1u32..20,
        only_housing in any::<bool>(),
    ) {
        let docs = seed(n);
        let page_s = page.to_string();
        let limit_s = limit.to_string();
        let mut params = vec![("page", page_s.as_str()), ("limit", limit_s.as_str())];
        if only_housing {
            params.push(("housing", "true"));
        }

        let query = ListQuery::parse(params, &SCHEMA, &QueryOptions::default()).unwrap();
        let find = query.to_find();
        let data = find.evaluate(&docs);
        let total = devcamper_query::FindQuery::filtered(query.filter.clone()).evaluate(&docs).len() as u64;
        let meta = PaginationMeta::compute(query.page, query.limit, total);

        prop_assert!(data.len() as u32 <= limit);
        let remaining_after_page = total > query.skip() + data.len() as u64;
        prop_assert_eq!(meta.next.is_some(), remaining_after_page);
        prop_assert_eq!(meta.prev.is_some(), page > 1);
    }
}

#[test]
fn second_page_of_five_newest_first() {
    let docs = seed(5);
    let query = ListQuery::parse(
        [("limit", "2"), ("page", "2"), ("sort", "-createdAt")],
        &SCHEMA,
        &QueryOptions::default(),
    )
    .unwrap();

    let data = query.to_find().evaluate(&docs);
    let ids: Vec<_> = data.iter().map(|d| d["id"].as_str().unwrap()).collect();
    // Ranked 3rd and 4th by descending creation time.
    assert_eq!(ids, vec!["0002", "0001"]);

    let meta = PaginationMeta::compute(query.page, query.limit, docs.len() as u64);
    assert_eq!(meta.next.map(|l| l.page), Some(3));
    assert_eq!(meta.prev.map(|l| l.page), Some(1));
}
