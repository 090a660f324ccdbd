use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use devcamper_core::DocumentId;
use devcamper_query::{Document, Filter, FindQuery, ID_FIELD, Schema};

/// Store operation error.
///
/// Infrastructure failures, as opposed to domain validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no document in {collection} with id of {id}")]
    NotFound { collection: String, id: DocumentId },

    /// A unique key set of the collection schema would be violated.
    #[error("duplicate value for {fields:?} in {collection}")]
    Duplicate {
        collection: String,
        fields: Vec<String>,
    },

    /// A document could not be (de)serialized or lacks a valid `id`.
    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Async collection of JSON documents.
#[async_trait::async_trait]
pub trait DocumentCollection: Send + Sync {
    fn schema(&self) -> &Schema;

    /// Insert a new document; fails with `Duplicate` on a unique-key clash.
    async fn insert(&self, doc: Document) -> Result<(), StoreError>;

    /// Insert `doc` unless some stored document matches `guard`, checked and
    /// written under the same lock. Returns `false` when the guard matched and
    /// nothing was written.
    async fn insert_unless(&self, doc: Document, guard: &Filter) -> Result<bool, StoreError>;

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Replace an existing document wholesale; fails with `NotFound` when the
    /// id is unknown.
    async fn replace(&self, doc: Document) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, id: DocumentId) -> Result<bool, StoreError>;

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
impl<S> DocumentCollection for Arc<S>
where
    S: DocumentCollection + ?Sized,
{
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        (**self).insert(doc).await
    }

    async fn insert_unless(&self, doc: Document, guard: &Filter) -> Result<bool, StoreError> {
        (**self).insert_unless(doc, guard).await
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        (**self).get(id).await
    }

    async fn replace(&self, doc: Document) -> Result<(), StoreError> {
        (**self).replace(doc).await
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, StoreError> {
        (**self).delete(id).await
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        (**self).find(query).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        (**self).count(filter).await
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        (**self).delete_many(filter).await
    }
}

/// The identity of a stored document.
pub fn document_id(doc: &Document) -> Result<DocumentId, StoreError> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| StoreError::Malformed("document has no valid id".to_string()))
}

/// Values of a unique key set, or `None` when any part is missing or null
/// (such documents never clash).
pub(crate) fn unique_key<'a>(doc: &'a Document, fields: &[&str]) -> Option<Vec<&'a Value>> {
    fields
        .iter()
        .map(|f| doc.get(*f).filter(|v| !v.is_null()))
        .collect()
}

pub(crate) fn duplicate(schema: &Schema, fields: &[&str]) -> StoreError {
    StoreError::Duplicate {
        collection: schema.collection.to_string(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}
