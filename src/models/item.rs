use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Document;
use crate::error::{AppError, AppResult};
use crate::query::FieldFilter;
use crate::repository::Entity;

use super::record_id::RecordId;
use super::timestamp::{self, rfc3339};
use super::validation::{require_email, require_non_negative, require_text};

/// Caller-settable fields of an item. `insert_date` is deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayload {
    pub email: String,
    pub item_name: String,
    pub quantity: i64,
    #[serde(with = "rfc3339")]
    pub expiry_date: DateTime<Utc>,
}

impl ItemPayload {
    /// Validates raw request fields and parses `expiry_date` (ISO date or date-time).
    pub fn parse(email: String, item_name: String, quantity: i64, expiry_date: &str) -> AppResult<Self> {
        require_email("email", &email)?;
        require_text("item_name", &item_name)?;
        require_non_negative("quantity", quantity)?;
        require_text("expiry_date", expiry_date)?;
        let expiry_date = timestamp::parse_iso8601(expiry_date).ok_or_else(|| {
            AppError::InvalidInput(format!("expiry_date '{}' is not an ISO-8601 date", expiry_date))
        })?;

        Ok(Self {
            email,
            item_name,
            quantity,
            expiry_date,
        })
    }
}

#[derive(Deserialize)]
struct StoredItem {
    email: String,
    item_name: String,
    quantity: i64,
    #[serde(with = "rfc3339")]
    expiry_date: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    insert_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemModel {
    pub id: RecordId,
    pub email: String,
    pub item_name: String,
    pub quantity: i64,
    pub expiry_date: DateTime<Utc>,
    pub insert_date: DateTime<Utc>,
}

impl Entity for ItemModel {
    const COLLECTION: &'static str = "items";
    const CREATED_AT_FIELD: &'static str = "insert_date";
    const LABEL: &'static str = "Item";
    const FILTERS: &'static [FieldFilter] = &[
        FieldFilter::exact("email"),
        FieldFilter::after("expiry_date"),
        FieldFilter::after("insert_date"),
        FieldFilter::at_least("quantity"),
    ];

    type Payload = ItemPayload;

    fn from_document(id: RecordId, doc: Document) -> AppResult<Self> {
        let stored: StoredItem = serde_json::from_value(doc.into())?;
        Ok(Self {
            id,
            email: stored.email,
            item_name: stored.item_name,
            quantity: stored.quantity,
            expiry_date: stored.expiry_date,
            insert_date: stored.insert_date,
        })
    }
}
