use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::RecordId;
use crate::query::{GroupCount, GroupCountStage, Predicate};

use super::store::{Document, DocumentStore, UpdateOutcome};

/// In-process store used when no database is configured and by the tests.
/// Each collection keeps its documents in insertion order.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<(RecordId, Document)>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[tonic::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> AppResult<RecordId> {
        let id = RecordId::new_random();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push((id, doc));
        Ok(id)
    }

    async fn find_one(&self, collection: &str, id: &RecordId) -> AppResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| {
            docs.iter()
                .find(|(doc_id, _)| doc_id == id)
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> AppResult<Vec<(RecordId, Document)>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| predicate.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &RecordId,
        set: Document,
    ) -> AppResult<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let Some((_, doc)) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(doc_id, _)| doc_id == id))
        else {
            return Ok(UpdateOutcome::default());
        };

        let mut modified = false;
        for (field, value) in set {
            if doc.get(&field) != Some(&value) {
                doc.insert(field, value);
                modified = true;
            }
        }
        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: &str, id: &RecordId) -> AppResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|(doc_id, _)| doc_id == id) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn group_count(
        &self,
        collection: &str,
        stage: &GroupCountStage,
    ) -> AppResult<Vec<GroupCount>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| stage.evaluate(docs.iter().map(|(_, doc)| doc)))
            .unwrap_or_default())
    }

    fn backend(&self) -> &str {
        "memory"
    }
}
