use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use devcamper_core::{DocumentId, Entity};
use devcamper_query::{Document, Filter, FindQuery, ID_FIELD, SortKey};

use super::{DocumentCollection, StoreError};

/// Typed view over a collection: entities in, entities out.
pub struct Repository<T> {
    collection: Arc<dyn DocumentCollection>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    pub async fn get(&self, id: DocumentId) -> Result<Option<T>, StoreError> {
        self.collection.get(id).await?.map(from_document).transpose()
    }

    /// Like [`Self::get`], but a missing document is an error.
    pub async fn require(&self, id: DocumentId) -> Result<T, StoreError> {
        self.get(id).await?.ok_or_else(|| StoreError::NotFound {
            collection: T::COLLECTION.to_string(),
            id,
        })
    }

    pub async fn insert(&self, entity: &T) -> Result<(), StoreError> {
        self.collection.insert(to_document(entity)?).await
    }

    /// Insert unless an entity matching `guard` already exists; see
    /// [`DocumentCollection::insert_unless`].
    pub async fn insert_unless(&self, entity: &T, guard: &Filter) -> Result<bool, StoreError> {
        self.collection.insert_unless(to_document(entity)?, guard).await
    }

    pub async fn save(&self, entity: &T) -> Result<(), StoreError> {
        self.collection.replace(to_document(entity)?).await
    }

    pub async fn delete(&self, id: DocumentId) -> Result<bool, StoreError> {
        self.collection.delete(id).await
    }

    pub async fn find(&self, query: &FindQuery) -> Result<Vec<T>, StoreError> {
        self.collection
            .find(query)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// All entities matching `filter`, oldest first.
    pub async fn find_all(&self, filter: Filter) -> Result<Vec<T>, StoreError> {
        let mut query = FindQuery::filtered(filter);
        query.sort = vec![SortKey::asc(ID_FIELD)];
        self.find(&query).await
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>, StoreError> {
        let query = FindQuery {
            limit: Some(1),
            ..FindQuery::filtered(filter)
        };
        Ok(self.find(&query).await?.into_iter().next())
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.collection.count(filter).await
    }

    pub async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.collection.delete_many(filter).await
    }
}

pub fn to_document<T: Serialize>(entity: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Malformed(format!("expected an object, got {other}"))),
        Err(e) => Err(StoreError::Malformed(e.to_string())),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Malformed(e.to_string()))
}

/// Filter value for a reference field holding `id`.
pub fn id_value(id: DocumentId) -> Value {
    Value::String(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCollection;
    use chrono::Utc;
    use devcamper_catalog::{Course, CourseInput, MinimumSkill, Weeks, course};

    fn repo() -> Repository<Course> {
        Repository::new(Arc::new(InMemoryCollection::new(course::SCHEMA)))
    }

    fn new_course(bootcamp: DocumentId, tuition: f64) -> Course {
        CourseInput {
            title: Some("Course".into()),
            description: Some("Desc".into()),
            weeks: Some(Weeks::Count(6)),
            tuition: Some(tuition),
            minimum_skill: Some(MinimumSkill::Intermediate),
            scholarship_available: None,
        }
        .into_course(bootcamp, DocumentId::new(), Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn typed_round_trip_and_lookup_by_reference() {
        let repo = repo();
        let bootcamp = DocumentId::new();
        let a = new_course(bootcamp, 100.0);
        let b = new_course(DocumentId::new(), 200.0);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        assert_eq!(repo.require(a.id).await.unwrap(), a);
        let of_bootcamp = repo
            .find_all(Filter::new().and_eq("bootcamp", id_value(bootcamp)))
            .await
            .unwrap();
        assert_eq!(of_bootcamp, vec![a]);
    }

    #[tokio::test]
    async fn require_missing_is_not_found() {
        let id = DocumentId::new();
        assert_eq!(
            repo().require(id).await.unwrap_err(),
            StoreError::NotFound {
                collection: "courses".into(),
                id
            }
        );
    }
}
