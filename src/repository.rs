use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::db::{Document, DocumentStore};
use crate::error::{AppError, AppResult};
use crate::models::timestamp::format_rfc3339;
use crate::models::RecordId;
use crate::query::{FieldFilter, GroupCount, GroupCountStage, Predicate};

/// A record type persisted as one document per record in its own collection.
pub trait Entity: Sized + Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Server-assigned creation timestamp; never taken from a payload.
    const CREATED_AT_FIELD: &'static str;
    /// Noun used in not-found messages.
    const LABEL: &'static str;
    /// Filterable fields and how each one is compared.
    const FILTERS: &'static [FieldFilter];

    type Payload: Serialize + Send + Sync;

    fn from_document(id: RecordId, doc: Document) -> AppResult<Self>;
}

fn to_document<T: Serialize>(value: &T) -> AppResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "payload serialized to a non-object value: {}",
            other
        ))),
    }
}

/// CRUD and listing for one entity type over a shared document store.
pub struct Repository<E> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    fn not_found(&self) -> AppError {
        AppError::NotFound(format!("{} not found", E::LABEL))
    }

    pub async fn create(&self, payload: &E::Payload) -> AppResult<RecordId> {
        let mut doc = to_document(payload)?;
        doc.insert(
            E::CREATED_AT_FIELD.to_string(),
            Value::String(format_rfc3339(&Utc::now())),
        );
        let id = self.store.insert_one(E::COLLECTION, doc).await?;
        tracing::info!("Created {} in {}: id={}", E::LABEL, E::COLLECTION, id);
        Ok(id)
    }

    pub async fn get_by_id(&self, id: &RecordId) -> AppResult<E> {
        let doc = self
            .store
            .find_one(E::COLLECTION, id)
            .await?
            .ok_or_else(|| self.not_found())?;
        E::from_document(*id, doc)
    }

    /// Rewrites every payload field. A call that changes nothing is reported
    /// as `NotFound`, same as an unknown id.
    pub async fn update_by_id(&self, id: &RecordId, payload: &E::Payload) -> AppResult<()> {
        let mut set = to_document(payload)?;
        set.remove(E::CREATED_AT_FIELD);
        let outcome = self.store.update_one(E::COLLECTION, id, set).await?;
        tracing::info!(
            "Updated {} in {}: id={}, matched={}, modified={}",
            E::LABEL,
            E::COLLECTION,
            id,
            outcome.matched,
            outcome.modified
        );
        if outcome.modified == 0 {
            return Err(self.not_found());
        }
        Ok(())
    }

    pub async fn delete_by_id(&self, id: &RecordId) -> AppResult<()> {
        let deleted = self.store.delete_one(E::COLLECTION, id).await?;
        if deleted == 0 {
            return Err(self.not_found());
        }
        tracing::info!("Deleted {} from {}: id={}", E::LABEL, E::COLLECTION, id);
        Ok(())
    }

    pub async fn list(&self, predicate: &Predicate) -> AppResult<Vec<E>> {
        tracing::debug!("List {}: {:?}", E::COLLECTION, predicate);
        self.store
            .find(E::COLLECTION, predicate)
            .await?
            .into_iter()
            .map(|(id, doc)| E::from_document(id, doc))
            .collect()
    }

    pub async fn count_by(&self, stage: &GroupCountStage) -> AppResult<Vec<GroupCount>> {
        tracing::debug!("Group {} by {}: {:?}", E::COLLECTION, stage.group_by, stage.predicate);
        self.store.group_count(E::COLLECTION, stage).await
    }
}
