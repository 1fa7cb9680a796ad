use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::db::Document;
use crate::error::{AppError, AppResult};
use crate::models::timestamp::parse_iso8601;

/// How a stored field is compared against the supplied filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Exact match.
    Eq,
    /// Stored value strictly greater than the filter value.
    Gt,
    /// Stored value greater than or equal to the filter value.
    Gte,
}

impl Comparison {
    pub fn holds<T: PartialOrd>(self, stored: &T, wanted: &T) -> bool {
        match self {
            Comparison::Eq => stored == wanted,
            Comparison::Gt => stored > wanted,
            Comparison::Gte => stored >= wanted,
        }
    }

    pub fn sql_operator(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
        }
    }
}

/// Type a filter parameter is coerced to before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

/// One entry of an entity's filter specification.
#[derive(Debug, Clone, Copy)]
pub struct FieldFilter {
    pub field: &'static str,
    pub comparison: Comparison,
    pub kind: ValueKind,
}

impl FieldFilter {
    pub const fn exact(field: &'static str) -> Self {
        Self {
            field,
            comparison: Comparison::Eq,
            kind: ValueKind::Text,
        }
    }

    pub const fn after(field: &'static str) -> Self {
        Self {
            field,
            comparison: Comparison::Gt,
            kind: ValueKind::Timestamp,
        }
    }

    pub const fn at_least(field: &'static str) -> Self {
        Self {
            field,
            comparison: Comparison::Gte,
            kind: ValueKind::Integer,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: &'static str,
    pub comparison: Comparison,
    pub value: FilterValue,
}

impl Condition {
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(stored) = doc.get(self.field) else {
            return false;
        };
        match (&self.value, stored) {
            (FilterValue::Text(wanted), Value::String(s)) => {
                self.comparison.holds(&s.as_str(), &wanted.as_str())
            }
            (FilterValue::Integer(wanted), Value::Number(n)) => n
                .as_i64()
                .is_some_and(|n| self.comparison.holds(&n, wanted)),
            (FilterValue::Timestamp(wanted), Value::String(s)) => parse_iso8601(s)
                .is_some_and(|stored| self.comparison.holds(&stored, wanted)),
            _ => false,
        }
    }
}

/// Conjunction of conditions; no conditions matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }
}

/// Raw value of a caller-supplied filter parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Text(String),
    Integer(i64),
}

impl From<String> for FilterInput {
    fn from(value: String) -> Self {
        FilterInput::Text(value)
    }
}

impl From<&str> for FilterInput {
    fn from(value: &str) -> Self {
        FilterInput::Text(value.to_string())
    }
}

impl From<i64> for FilterInput {
    fn from(value: i64) -> Self {
        FilterInput::Integer(value)
    }
}

/// Named optional filter parameters as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    values: Vec<(String, FilterInput)>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a parameter if present. Empty text counts as absent.
    pub fn set<V: Into<FilterInput>>(mut self, name: &str, value: Option<V>) -> Self {
        match value.map(Into::into) {
            None => {}
            Some(FilterInput::Text(s)) if s.is_empty() => {}
            Some(input) => self.values.push((name.to_string(), input)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, name: &str) -> Option<&FilterInput> {
        self.values
            .iter()
            .rev()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v)
    }
}

fn coerce(filter: &FieldFilter, input: &FilterInput) -> AppResult<FilterValue> {
    match (filter.kind, input) {
        (ValueKind::Text, FilterInput::Text(s)) => Ok(FilterValue::Text(s.clone())),
        (ValueKind::Text, FilterInput::Integer(n)) => Ok(FilterValue::Text(n.to_string())),
        (ValueKind::Integer, FilterInput::Integer(n)) => Ok(FilterValue::Integer(*n)),
        (ValueKind::Integer, FilterInput::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(FilterValue::Integer)
            .map_err(|_| AppError::malformed_filter(filter.field, format!("'{}' is not an integer", s))),
        (ValueKind::Timestamp, FilterInput::Text(s)) => parse_iso8601(s)
            .map(FilterValue::Timestamp)
            .ok_or_else(|| {
                AppError::malformed_filter(filter.field, format!("'{}' is not an ISO-8601 date", s))
            }),
        (ValueKind::Timestamp, FilterInput::Integer(n)) => Err(AppError::malformed_filter(
            filter.field,
            format!("'{}' is not an ISO-8601 date", n),
        )),
    }
}

/// Builds a conjunctive predicate from the entity's filter specification.
///
/// Conditions follow the order of `spec`, not of `params`.
pub fn build_predicate(spec: &[FieldFilter], params: &FilterParams) -> AppResult<Predicate> {
    if let Some((unknown, _)) = params
        .values
        .iter()
        .find(|(name, _)| !spec.iter().any(|f| f.field == name.as_str()))
    {
        return Err(AppError::malformed_filter(unknown.as_str(), "unsupported filter"));
    }

    let mut conditions = Vec::new();
    for filter in spec {
        if let Some(input) = params.get(filter.field) {
            conditions.push(Condition {
                field: filter.field,
                comparison: filter.comparison,
                value: coerce(filter, input)?,
            });
        }
    }
    Ok(Predicate { conditions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const SPEC: &[FieldFilter] = &[
        FieldFilter::exact("email"),
        FieldFilter::after("expiry_date"),
        FieldFilter::at_least("quantity"),
    ];

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_no_params_is_match_all() {
        let predicate = build_predicate(SPEC, &FilterParams::new()).unwrap();
        assert!(predicate.is_match_all());
        assert!(predicate.matches(&doc(json!({ "anything": 1 }))));
    }

    #[test]
    fn test_empty_text_counts_as_absent() {
        let params = FilterParams::new()
            .set("email", Some(""))
            .set::<String>("expiry_date", None);
        assert!(params.is_empty());
    }

    #[test]
    fn test_each_param_contributes_one_condition() {
        let params = FilterParams::new()
            .set("quantity", Some(3i64))
            .set("email", Some("a@example.com"));
        let predicate = build_predicate(SPEC, &params).unwrap();
        assert_eq!(
            predicate.conditions,
            vec![
                Condition {
                    field: "email",
                    comparison: Comparison::Eq,
                    value: FilterValue::Text("a@example.com".into()),
                },
                Condition {
                    field: "quantity",
                    comparison: Comparison::Gte,
                    value: FilterValue::Integer(3),
                },
            ]
        );
    }

    #[test]
    fn test_quantity_is_inclusive_threshold() {
        let five = doc(json!({ "quantity": 5 }));
        let ten = doc(json!({ "quantity": 10 }));
        let at_least = |n: i64| {
            build_predicate(SPEC, &FilterParams::new().set("quantity", Some(n))).unwrap()
        };

        assert!(at_least(10).matches(&ten));
        assert!(!at_least(10).matches(&five));
        assert!(at_least(5).matches(&five));
        assert!(!at_least(11).matches(&ten));
    }

    #[test]
    fn test_expiry_date_is_strictly_after() {
        let item = doc(json!({ "expiry_date": "2024-01-10T00:00:00.000000Z" }));
        let after = |d: &str| {
            build_predicate(SPEC, &FilterParams::new().set("expiry_date", Some(d))).unwrap()
        };

        assert!(!after("2024-01-10").matches(&item));
        assert!(after("2024-01-09").matches(&item));
        assert_eq!(
            after("2024-01-09").conditions[0].value,
            FilterValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_or_mistyped_field_never_matches() {
        let predicate =
            build_predicate(SPEC, &FilterParams::new().set("quantity", Some(0i64))).unwrap();
        assert!(!predicate.matches(&doc(json!({ "email": "a@example.com" }))));
        assert!(!predicate.matches(&doc(json!({ "quantity": "7" }))));
    }

    #[test]
    fn test_malformed_date_is_a_filter_error() {
        let params = FilterParams::new().set("expiry_date", Some("next tuesday"));
        match build_predicate(SPEC, &params) {
            Err(AppError::MalformedFilterValue { field, .. }) => assert_eq!(field, "expiry_date"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_textual_integer_is_coerced() {
        let params = FilterParams::new().set("quantity", Some("12"));
        let predicate = build_predicate(SPEC, &params).unwrap();
        assert_eq!(predicate.conditions[0].value, FilterValue::Integer(12));

        let params = FilterParams::new().set("quantity", Some("twelve"));
        assert!(matches!(
            build_predicate(SPEC, &params),
            Err(AppError::MalformedFilterValue { .. })
        ));
    }

    #[test]
    fn test_unknown_param_is_rejected() {
        let params = FilterParams::new().set("location", Some("HQ"));
        assert!(matches!(
            build_predicate(SPEC, &params),
            Err(AppError::MalformedFilterValue { .. })
        ));
    }
}
