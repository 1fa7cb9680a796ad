use std::collections::BTreeMap;

use serde_json::Value;

use crate::db::Document;

use super::filter::Predicate;

/// Match-then-group-count pipeline: documents selected by `predicate` are
/// collapsed into one row per distinct value of `group_by`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCountStage {
    pub predicate: Predicate,
    pub group_by: &'static str,
}

impl GroupCountStage {
    pub fn new(predicate: Predicate, group_by: &'static str) -> Self {
        Self {
            predicate,
            group_by,
        }
    }

    /// Evaluates the stage over in-process documents. Groups come out sorted
    /// by key; documents lacking a string key are grouped under "".
    pub fn evaluate<'a, I>(&self, docs: I) -> Vec<GroupCount>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for doc in docs.into_iter().filter(|d| self.predicate.matches(d)) {
            let key = match doc.get(self.group_by) {
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{Comparison, Condition, FilterValue};
    use serde_json::json;

    fn doc(email: &str, quantity: i64) -> Document {
        match json!({ "email": email, "quantity": quantity }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_groups_by_key_with_counts() {
        let docs = vec![
            doc("b@example.com", 1),
            doc("a@example.com", 2),
            doc("b@example.com", 3),
        ];
        let stage = GroupCountStage::new(Predicate::match_all(), "email");
        assert_eq!(
            stage.evaluate(&docs),
            vec![
                GroupCount { key: "a@example.com".into(), count: 1 },
                GroupCount { key: "b@example.com".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_group_keys_sort_in_byte_order() {
        let docs = vec![
            doc("b@example.com", 1),
            doc("\u{e9}@example.com", 1),
            doc("B@example.com", 1),
            doc("a@example.com", 1),
        ];
        let keys: Vec<String> = GroupCountStage::new(Predicate::match_all(), "email")
            .evaluate(&docs)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(
            keys,
            vec!["B@example.com", "a@example.com", "b@example.com", "\u{e9}@example.com"]
        );
    }

    #[test]
    fn test_predicate_runs_before_grouping() {
        let docs = vec![doc("a@example.com", 1), doc("a@example.com", 9), doc("b@example.com", 2)];
        let predicate = Predicate {
            conditions: vec![Condition {
                field: "quantity",
                comparison: Comparison::Gte,
                value: FilterValue::Integer(2),
            }],
        };
        let stage = GroupCountStage::new(predicate, "email");
        assert_eq!(
            stage.evaluate(&docs),
            vec![
                GroupCount { key: "a@example.com".into(), count: 1 },
                GroupCount { key: "b@example.com".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_no_matches_yields_no_groups() {
        let docs = vec![doc("a@example.com", 1)];
        let predicate = Predicate {
            conditions: vec![Condition {
                field: "email",
                comparison: Comparison::Eq,
                value: FilterValue::Text("z@example.com".into()),
            }],
        };
        assert!(GroupCountStage::new(predicate, "email").evaluate(&docs).is_empty());
    }
}
