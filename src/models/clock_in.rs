use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Document;
use crate::error::AppResult;
use crate::query::FieldFilter;
use crate::repository::Entity;

use super::record_id::RecordId;
use super::timestamp::rfc3339;
use super::validation::{require_email, require_text};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockInPayload {
    pub email: String,
    pub location: String,
}

impl ClockInPayload {
    pub fn parse(email: String, location: String) -> AppResult<Self> {
        require_email("email", &email)?;
        require_text("location", &location)?;
        Ok(Self { email, location })
    }
}

#[derive(Deserialize)]
struct StoredClockIn {
    email: String,
    location: String,
    #[serde(with = "rfc3339")]
    insert_datetime: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockInModel {
    pub id: RecordId,
    pub email: String,
    pub location: String,
    pub insert_datetime: DateTime<Utc>,
}

impl Entity for ClockInModel {
    const COLLECTION: &'static str = "clock_in_records";
    const CREATED_AT_FIELD: &'static str = "insert_datetime";
    const LABEL: &'static str = "Record";
    const FILTERS: &'static [FieldFilter] = &[
        FieldFilter::exact("email"),
        FieldFilter::exact("location"),
        FieldFilter::after("insert_datetime"),
    ];

    type Payload = ClockInPayload;

    fn from_document(id: RecordId, doc: Document) -> AppResult<Self> {
        let stored: StoredClockIn = serde_json::from_value(doc.into())?;
        Ok(Self {
            id,
            email: stored.email,
            location: stored.location,
            insert_datetime: stored.insert_datetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_parse_validates_fields() {
        assert!(ClockInPayload::parse("a@example.com".into(), "HQ".into()).is_ok());
        assert!(matches!(
            ClockInPayload::parse("a@".into(), "HQ".into()),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            ClockInPayload::parse("a@example.com".into(), " ".into()),
            Err(AppError::InvalidInput(_))
        ));
    }
}
