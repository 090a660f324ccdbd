//! Backend-neutral read query and its reference evaluation.

use crate::sort::compare_documents;
use crate::{Document, Filter, SortKey};

/// Filter + order + window. Projection is applied by the caller after the
/// fetch and before relation expansion, so a reference field left out by
/// `select` is not expanded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Evaluate over an in-memory set of documents.
    ///
    /// Sorting is stable: documents equal under every key keep input order.
    pub fn evaluate<'a, I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut matched: Vec<&Document> = docs.into_iter().filter(|d| self.filter.matches(d)).collect();
        if !self.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &self.sort));
        }

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        matched.into_iter().skip(skip).take(take).cloned().collect()
    }
}
