//! Structural comparison of JSON documents.
//!
//! Objects compare independently of key order, arrays position by position,
//! and numbers by value (`1` equals `1.0`).

use super::SnapshotRecord;
use crate::models::HttpResponse;
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Longest rendering of a value in a change line before it is truncated.
const SUMMARY_LIMIT: usize = 80;

/// One difference between two documents.
///
/// `old` is `None` for an added key or element and `new` is `None` for a
/// removed one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub path: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} → {}",
            self.path,
            summarize(self.old.as_ref()),
            summarize(self.new.as_ref())
        )
    }
}

fn summarize(value: Option<&Value>) -> String {
    let text = match value {
        None => return "(absent)".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if text.chars().count() > SUMMARY_LIMIT {
        let head: String = text.chars().take(SUMMARY_LIMIT - 3).collect();
        format!("{}...", head)
    } else {
        text
    }
}

/// Deep equality with numeric comparison by value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Lists every difference between `old` and `new`.
///
/// An empty result means the documents are equal. Paths use the same syntax
/// as path expressions (`user.name`, `items[2]`); the root itself is the
/// empty path.
pub fn diff_values(old: &Value, new: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_at("", old, new, &mut changes);
    changes
}

fn diff_at(path: &str, old: &Value, new: &Value, changes: &mut Vec<Change>) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) => {
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let child = join_key(path, key);
                match (a.get(key.as_str()), b.get(key.as_str())) {
                    (Some(x), Some(y)) => diff_at(&child, x, y, changes),
                    (x, y) => changes.push(Change {
                        path: child,
                        old: x.cloned(),
                        new: y.cloned(),
                    }),
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for i in 0..a.len().max(b.len()) {
                let child = format!("{}[{}]", path, i);
                match (a.get(i), b.get(i)) {
                    (Some(x), Some(y)) => diff_at(&child, x, y, changes),
                    (x, y) => changes.push(Change {
                        path: child,
                        old: x.cloned(),
                        new: y.cloned(),
                    }),
                }
            }
        }
        _ if values_equal(old, new) => {}
        _ => changes.push(Change {
            path: path.to_string(),
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    let needs_brackets = key.is_empty() || key.contains(['.', '[', ']']);
    match (prefix.is_empty(), needs_brackets) {
        (_, true) => format!("{}[{}]", prefix, key),
        (true, false) => key.to_string(),
        (false, false) => format!("{}.{}", prefix, key),
    }
}

/// Compares a saved snapshot with a fresh response.
///
/// Reports a status change at `status_code` and body changes under `body`.
/// Headers are not compared.
pub fn compare_response(snapshot: &SnapshotRecord, response: &HttpResponse) -> Vec<Change> {
    let mut changes = Vec::new();
    if snapshot.status_code != response.status_code {
        changes.push(Change {
            path: "status_code".to_string(),
            old: Some(Value::from(snapshot.status_code)),
            new: Some(Value::from(response.status_code)),
        });
    }
    diff_at("body", &snapshot.body, &response.body, &mut changes);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents() {
        let doc = json!({"a": [1, {"b": null}], "c": "x"});
        assert!(diff_values(&doc, &doc).is_empty());
    }

    #[test]
    fn test_single_leaf_change() {
        let changes = diff_values(&json!({"a": 1}), &json!({"a": 2}));
        assert_eq!(
            changes,
            vec![Change {
                path: "a".to_string(),
                old: Some(json!(1)),
                new: Some(json!(2)),
            }]
        );
    }

    #[test]
    fn test_key_order_is_ignored() {
        let a: Value = serde_json::from_str(r#"{"x": 1, "y": 2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y": 2, "x": 1}"#).unwrap();
        assert!(diff_values(&a, &b).is_empty());
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        assert!(diff_values(&json!({"n": 1}), &json!({"n": 1.0})).is_empty());
        assert_eq!(diff_values(&json!(1), &json!(1.5)).len(), 1);
    }

    #[test]
    fn test_array_order_matters() {
        let changes = diff_values(&json!([1, 2]), &json!([2, 1]));
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["[0]", "[1]"]);
    }

    #[test]
    fn test_added_and_removed() {
        let changes = diff_values(
            &json!({"keep": 1, "gone": true, "list": [1]}),
            &json!({"keep": 1, "new": "v", "list": [1, 2]}),
        );
        assert_eq!(changes.len(), 3);
        assert!(changes.contains(&Change {
            path: "gone".to_string(),
            old: Some(json!(true)),
            new: None,
        }));
        assert!(changes.contains(&Change {
            path: "new".to_string(),
            old: None,
            new: Some(json!("v")),
        }));
        assert!(changes.contains(&Change {
            path: "list[1]".to_string(),
            old: None,
            new: Some(json!(2)),
        }));
    }

    #[test]
    fn test_type_change_is_one_change() {
        let changes = diff_values(&json!({"a": {"b": 1}}), &json!({"a": [1]}));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "a");
    }

    #[test]
    fn test_dotted_keys_use_brackets() {
        let changes = diff_values(&json!({"a.b": 1}), &json!({"a.b": 2}));
        assert_eq!(changes[0].path, "[a.b]");
    }

    #[test]
    fn test_display() {
        let change = Change {
            path: "body.name".to_string(),
            old: Some(json!("Ada")),
            new: None,
        };
        assert_eq!(change.to_string(), "body.name: Ada → (absent)");

        let long = Change {
            path: "body".to_string(),
            old: Some(json!("x".repeat(100))),
            new: Some(json!(1)),
        };
        assert!(long.to_string().contains("..."));
    }

    #[test]
    fn test_compare_response() {
        let snapshot = SnapshotRecord {
            status_code: 200,
            headers: Default::default(),
            body: json!({"id": 1, "name": "a"}),
            saved_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let response = HttpResponse::new(201, json!({"id": 1, "name": "b"}));
        let changes = compare_response(&snapshot, &response);
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["status_code", "body.name"]);

        let same = HttpResponse::new(200, json!({"name": "a", "id": 1}));
        assert!(compare_response(&snapshot, &same).is_empty());
    }
}
