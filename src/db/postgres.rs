use std::sync::LazyLock;

use regex::Regex;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::RecordId;
use crate::query::{FilterValue, GroupCount, GroupCountStage, Predicate};

use super::store::{Document, DocumentStore, UpdateOutcome};

/// Collection and field names are spliced into SQL, so only plain identifiers pass.
static RE_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap());

fn ident(name: &str) -> AppResult<&str> {
    if RE_IDENT.is_match(name) {
        Ok(name)
    } else {
        Err(AppError::Internal(format!("invalid collection or field name: {}", name)))
    }
}

/// Each collection is a table of JSONB documents keyed by a server-generated UUID.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table for a collection if it does not exist yet.
    pub async fn ensure_collection(&self, collection: &str) -> AppResult<()> {
        let table = ident(collection)?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id UUID PRIMARY KEY DEFAULT gen_random_uuid(), \
             seq BIGSERIAL NOT NULL, \
             doc JSONB NOT NULL)",
            table
        ))
        .execute(&self.pool)
        .await?;
        tracing::info!("Collection ready: {}", table);
        Ok(())
    }
}

/// Appends ` AND <condition>` for every predicate condition.
fn push_conditions<'a>(qb: &mut QueryBuilder<'a, Postgres>, predicate: &'a Predicate) -> AppResult<()> {
    for condition in &predicate.conditions {
        let field = ident(condition.field)?;
        let op = condition.comparison.sql_operator();
        qb.push(" AND ");
        match &condition.value {
            FilterValue::Text(value) => {
                qb.push(format!("doc->>'{}' {} ", field, op));
                qb.push_bind(value.as_str());
            }
            FilterValue::Integer(value) => {
                qb.push(format!("(doc->>'{}')::bigint {} ", field, op));
                qb.push_bind(*value);
            }
            FilterValue::Timestamp(value) => {
                qb.push(format!("(doc->>'{}')::timestamptz {} ", field, op));
                qb.push_bind(*value);
            }
        }
    }
    Ok(())
}

fn select_query<'a>(collection: &str, predicate: &'a Predicate) -> AppResult<QueryBuilder<'a, Postgres>> {
    let mut qb = QueryBuilder::new(format!("SELECT id, doc FROM {} WHERE TRUE", ident(collection)?));
    push_conditions(&mut qb, predicate)?;
    qb.push(" ORDER BY seq");
    Ok(qb)
}

fn group_count_query<'a>(
    collection: &str,
    stage: &'a GroupCountStage,
) -> AppResult<QueryBuilder<'a, Postgres>> {
    let key = format!("COALESCE(doc->>'{}', '')", ident(stage.group_by)?);
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} AS key, COUNT(*) AS count FROM {} WHERE TRUE",
        key,
        ident(collection)?
    ));
    push_conditions(&mut qb, &stage.predicate)?;
    // Byte order, so groups sort the same regardless of database collation.
    qb.push(format!(" GROUP BY 1 ORDER BY {} COLLATE \"C\"", key));
    Ok(qb)
}

/// Merges `$2` into the document with id `$1` and reports how many rows
/// matched and how many actually changed.
fn update_query(collection: &str) -> AppResult<String> {
    // `||` replaces top-level keys, which is exactly field-wise set semantics.
    Ok(format!(
        "WITH target AS (SELECT id, doc FROM {t} WHERE id = $1 FOR UPDATE), \
         updated AS (\
         UPDATE {t} SET doc = {t}.doc || $2 FROM target \
         WHERE {t}.id = target.id AND (target.doc || $2) <> target.doc \
         RETURNING {t}.id) \
         SELECT (SELECT COUNT(*) FROM target), (SELECT COUNT(*) FROM updated)",
        t = ident(collection)?
    ))
}

#[tonic::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> AppResult<RecordId> {
        let id: Uuid = sqlx::query_scalar(&format!(
            "INSERT INTO {} (doc) VALUES ($1) RETURNING id",
            ident(collection)?
        ))
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await?;
        Ok(RecordId::from_uuid(id))
    }

    async fn find_one(&self, collection: &str, id: &RecordId) -> AppResult<Option<Document>> {
        let doc: Option<Json<Document>> = sqlx::query_scalar(&format!(
            "SELECT doc FROM {} WHERE id = $1",
            ident(collection)?
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc.map(|Json(doc)| doc))
    }

    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> AppResult<Vec<(RecordId, Document)>> {
        let mut qb = select_query(collection, predicate)?;
        tracing::debug!("find: {}", qb.sql());
        let rows: Vec<(Uuid, Json<Document>)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, Json(doc))| (RecordId::from_uuid(id), doc))
            .collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &RecordId,
        set: Document,
    ) -> AppResult<UpdateOutcome> {
        let sql = update_query(collection)?;
        let (matched, modified): (i64, i64) = sqlx::query_as(&sql)
            .bind(*id.as_uuid())
            .bind(Json(&set))
            .fetch_one(&self.pool)
            .await?;
        Ok(UpdateOutcome {
            matched: matched as u64,
            modified: modified as u64,
        })
    }

    async fn delete_one(&self, collection: &str, id: &RecordId) -> AppResult<u64> {
        let rows_affected = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", ident(collection)?))
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }

    async fn group_count(
        &self,
        collection: &str,
        stage: &GroupCountStage,
    ) -> AppResult<Vec<GroupCount>> {
        let mut qb = group_count_query(collection, stage)?;
        tracing::debug!("group_count: {}", qb.sql());
        let rows: Vec<(String, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect())
    }

    fn backend(&self) -> &str {
        "postgres"
    }
}
