//! Writing values into a document through a path.

use super::eval::find_field;
use super::{PathError, PathExpr, Segment};
use serde_json::{Map, Value};

/// Most `null` elements an injection may add to reach a concrete index.
pub const MAX_PADDING: usize = 10_000;

/// Sets the value at `expr` inside `document`, creating containers on the way.
///
/// Missing objects and arrays are created according to the segment that
/// addresses them; a value of the wrong kind in the way is replaced. Arrays
/// shorter than a concrete index are padded with `null`. Field segments reuse
/// an existing key that matches case-insensitively.
///
/// # Errors
///
/// Returns `PathError::Injection` when the path contains a wildcard or slice,
/// when a negative index points before the start of the array, or when an
/// index lies more than [`MAX_PADDING`] elements past the end of the array.
pub fn inject(expr: &PathExpr, document: &mut Value, value: Value) -> Result<(), PathError> {
    if let Some(segment) = expr.segments().iter().find(|s| s.is_collection()) {
        let kind = match segment {
            Segment::Wildcard => "wildcard",
            _ => "slice",
        };
        return Err(PathError::injection(
            expr.as_str(),
            format!("{} segments cannot be written", kind),
        ));
    }

    let mut current = document;
    for segment in expr.segments() {
        current = match segment {
            Segment::Field(name) => {
                let map = object_slot(current);
                let key = find_field(map, name)
                    .map(|(key, _)| key.clone())
                    .unwrap_or_else(|| name.clone());
                map.entry(key).or_insert(Value::Null)
            }
            Segment::Key(key) => object_slot(current)
                .entry(key.clone())
                .or_insert(Value::Null),
            Segment::Index(index) => {
                let items = array_slot(current);
                let position = if *index < 0 {
                    let resolved = items.len() as i64 + index;
                    if resolved < 0 {
                        return Err(PathError::injection(
                            expr.as_str(),
                            format!(
                                "index {} is out of range for an array of length {}",
                                index,
                                items.len()
                            ),
                        ));
                    }
                    resolved as usize
                } else {
                    *index as usize
                };
                if items.len() <= position {
                    if position - items.len() > MAX_PADDING {
                        return Err(PathError::injection(
                            expr.as_str(),
                            format!(
                                "index {} is too far past the end of an array of length {}",
                                index,
                                items.len()
                            ),
                        ));
                    }
                    items.resize(position + 1, Value::Null);
                }
                &mut items[position]
            }
            Segment::Wildcard | Segment::Slice { .. } => {
                return Err(PathError::injection(
                    expr.as_str(),
                    "collection segments cannot be written",
                ))
            }
        };
    }

    *current = value;
    Ok(())
}

fn object_slot(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("slot was just replaced with an object"),
    }
}

fn array_slot(value: &mut Value) -> &mut Vec<Value> {
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => items,
        _ => unreachable!("slot was just replaced with an array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::eval::evaluate;
    use serde_json::json;

    fn inject_str(path: &str, doc: &mut Value, value: Value) -> Result<(), PathError> {
        inject(&PathExpr::parse(path).unwrap(), doc, value)
    }

    #[test]
    fn test_sets_existing_field() {
        let mut doc = json!({"user": {"email": "old"}});
        inject_str("user.email", &mut doc, json!("new")).unwrap();
        assert_eq!(doc, json!({"user": {"email": "new"}}));
    }

    #[test]
    fn test_creates_intermediate_containers() {
        let mut doc = json!({});
        inject_str("user.tags[2].name", &mut doc, json!("x")).unwrap();
        assert_eq!(doc, json!({"user": {"tags": [null, null, {"name": "x"}]}}));
    }

    #[test]
    fn test_reuses_case_insensitive_key() {
        let mut doc = json!({"Email": "old"});
        inject_str("email", &mut doc, json!("new")).unwrap();
        assert_eq!(doc, json!({"Email": "new"}));
    }

    #[test]
    fn test_negative_index_into_existing_array() {
        let mut doc = json!({"items": [1, 2, 3]});
        inject_str("items[-1]", &mut doc, json!(9)).unwrap();
        assert_eq!(doc, json!({"items": [1, 2, 9]}));

        let err = inject_str("items[-5]", &mut doc, json!(0)).unwrap_err();
        assert!(matches!(err, PathError::Injection { .. }));
    }

    #[test]
    fn test_huge_index_is_rejected() {
        let mut doc = json!({});
        let err = inject_str("items[4611686018427387903]", &mut doc, Value::Null).unwrap_err();
        assert_eq!(err.path(), "items[4611686018427387903]");
        assert!(err.to_string().contains("too far past the end"));

        let limit = format!("items[{}]", MAX_PADDING);
        let mut doc = json!({});
        inject_str(&limit, &mut doc, json!(1)).unwrap();
        assert_eq!(doc["items"].as_array().unwrap().len(), MAX_PADDING + 1);

        let past = format!("items[{}]", MAX_PADDING + 1);
        assert!(inject_str(&past, &mut json!({}), json!(1)).is_err());
    }

    #[test]
    fn test_replaces_scalar_in_the_way() {
        let mut doc = json!({"user": "ada"});
        inject_str("user.name", &mut doc, json!("ada")).unwrap();
        assert_eq!(doc, json!({"user": {"name": "ada"}}));
    }

    #[test]
    fn test_wildcard_and_slice_are_rejected() {
        let mut doc = json!({"items": [1]});
        let err = inject_str("items[].id", &mut doc, json!(1)).unwrap_err();
        assert_eq!(err.path(), "items[].id");
        assert!(err.to_string().contains("wildcard"));

        let err = inject_str("items[0:1]", &mut doc, json!(1)).unwrap_err();
        assert!(err.to_string().contains("slice"));
        assert_eq!(doc, json!({"items": [1]}));
    }

    #[test]
    fn test_injected_value_is_found_again() {
        let mut doc = json!({"a": [{"B": 1}]});
        let expr = PathExpr::parse("a[0].b").unwrap();
        inject(&expr, &mut doc, json!("v")).unwrap();
        let found: Vec<&Value> = evaluate(&expr, &doc).into_iter().map(|m| m.value).collect();
        assert_eq!(found, vec![&json!("v")]);
    }
}
