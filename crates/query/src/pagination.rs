//! Page links and the list-response envelope.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: u32,
    pub limit: u32,
}

/// Links to neighbouring pages; each present only when that page exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

impl PaginationMeta {
    /// `next` iff records exist past this page, `prev` iff this is not page 1.
    pub fn compute(page: u32, limit: u32, total: u64) -> Self {
        let end = u64::from(page) * u64::from(limit);
        Self {
            next: (end < total).then(|| PageLink {
                page: page.saturating_add(1),
                limit,
            }),
            prev: (page > 1).then(|| PageLink {
                page: page - 1,
                limit,
            }),
        }
    }
}

/// Standard list response: `{ success, count, pagination, data }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedResult<T = Value> {
    pub success: bool,
    pub count: usize,
    pub pagination: PaginationMeta,
    pub data: Vec<T>,
}

impl<T> AdvancedResult<T> {
    pub fn new(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn middle_page_links_both_ways() {
        let meta = PaginationMeta::compute(2, 2, 5);
        assert_eq!(meta.next, Some(PageLink { page: 3, limit: 2 }));
        assert_eq!(meta.prev, Some(PageLink { page: 1, limit: 2 }));
    }

    #[test]
    fn last_full_page_has_no_next() {
        let meta = PaginationMeta::compute(2, 25, 50);
        assert_eq!(meta.next, None);
        assert!(meta.prev.is_some());
    }

    #[test]
    fn first_page_has_no_prev_and_serializes_empty() {
        let meta = PaginationMeta::compute(1, 25, 3);
        assert_eq!(serde_json::to_value(&meta).unwrap(), json!({}));
    }

    #[test]
    fn envelope_counts_page_records() {
        let result = AdvancedResult::new(vec![json!({"id": "a"})], PaginationMeta::default());
        let body = serde_json::to_value(&result).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 1);
        assert_eq!(body["pagination"], json!({}));
    }
}
