// Document store abstraction shared by the PostgreSQL and in-memory backends

use serde_json::{Map, Value};

use crate::error::AppResult;
use crate::models::RecordId;
use crate::query::{GroupCount, GroupCountStage, Predicate};

/// A stored document: field name to JSON value, without its identifier.
pub type Document = Map<String, Value>;

/// Counts reported by a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents whose identifier matched.
    pub matched: u64,
    /// Documents whose content actually changed.
    pub modified: u64,
}

#[tonic::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document and returns the identifier the store assigned to it.
    async fn insert_one(&self, collection: &str, doc: Document) -> AppResult<RecordId>;

    async fn find_one(&self, collection: &str, id: &RecordId) -> AppResult<Option<Document>>;

    /// All documents matching `predicate`, in store iteration order.
    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> AppResult<Vec<(RecordId, Document)>>;

    /// Sets every field of `set` on the matching document, leaving other fields untouched.
    async fn update_one(
        &self,
        collection: &str,
        id: &RecordId,
        set: Document,
    ) -> AppResult<UpdateOutcome>;

    /// Returns the number of documents deleted (0 or 1).
    async fn delete_one(&self, collection: &str, id: &RecordId) -> AppResult<u64>;

    /// Runs a match + group-by-count stage. Groups are ordered by key.
    async fn group_count(
        &self,
        collection: &str,
        stage: &GroupCountStage,
    ) -> AppResult<Vec<GroupCount>>;

    /// Short backend name for logging.
    fn backend(&self) -> &str;
}
