use std::collections::BTreeMap;
use std::sync::RwLock;

use devcamper_core::DocumentId;
use devcamper_query::{Document, Filter, FindQuery, Schema};

use super::collection::{DocumentCollection, StoreError, document_id, duplicate, unique_key};

/// In-memory document collection.
///
/// Intended for tests/dev and the default binary. Queries are evaluated with
/// `devcamper-query` over a full scan.
#[derive(Debug)]
pub struct InMemoryCollection {
    schema: Schema,
    docs: RwLock<BTreeMap<DocumentId, Document>>,
}

impl InMemoryCollection {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            docs: RwLock::new(BTreeMap::new()),
        }
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }

    fn insert_locked(
        &self,
        docs: &mut BTreeMap<DocumentId, Document>,
        id: DocumentId,
        doc: Document,
    ) -> Result<(), StoreError> {
        if docs.contains_key(&id) {
            return Err(StoreError::Duplicate {
                collection: self.schema.collection.to_string(),
                fields: vec!["id".to_string()],
            });
        }
        self.check_unique(docs, id, &doc)?;
        docs.insert(id, doc);
        Ok(())
    }

    fn check_unique(
        &self,
        docs: &BTreeMap<DocumentId, Document>,
        id: DocumentId,
        doc: &Document,
    ) -> Result<(), StoreError> {
        for fields in self.schema.unique {
            let Some(key) = unique_key(doc, fields) else {
                continue;
            };
            let clash = docs
                .iter()
                .any(|(other_id, other)| *other_id != id && unique_key(other, fields).as_ref() == Some(&key));
            if clash {
                return Err(duplicate(&self.schema, fields));
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentCollection for InMemoryCollection {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn insert(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        self.insert_locked(&mut docs, id, doc)
    }

    async fn insert_unless(&self, doc: Document, guard: &Filter) -> Result<bool, StoreError> {
        let id = document_id(&doc)?;
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        if docs.values().any(|d| guard.matches(d)) {
            return Ok(false);
        }
        self.insert_locked(&mut docs, id, doc)?;
        Ok(true)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(docs.get(&id).cloned())
    }

    async fn replace(&self, doc: Document) -> Result<(), StoreError> {
        let id = document_id(&doc)?;
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        if !docs.contains_key(&id) {
            return Err(StoreError::NotFound {
                collection: self.schema.collection.to_string(),
                id,
            });
        }
        self.check_unique(&docs, id, &doc)?;
        docs.insert(id, doc);
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        Ok(docs.remove(&id).is_some())
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(query.evaluate(docs.values()))
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let docs = self.docs.read().map_err(|_| Self::poisoned())?;
        Ok(docs.values().filter(|d| filter.matches(d)).count() as u64)
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut docs = self.docs.write().map_err(|_| Self::poisoned())?;
        let before = docs.len();
        docs.retain(|_, d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }
}
