//! Property tests for path evaluation, injection and filtering.

use proptest::prelude::*;
use reqcap::path::{evaluate, filter, inject, select, PathExpr};
use serde_json::{json, Map, Value};

/// Short names over a tiny alphabet, so documents and paths often hold
/// the same key in different cases.
fn mixed_case_name() -> impl Strategy<Value = String> {
    "[a-cA-C][a-cA-C_]{0,2}"
}

/// Literal bracket keys, including characters a bare field cannot hold.
fn bracket_key() -> impl Strategy<Value = String> {
    "[a-cA-C][a-cA-C.\\- ]{0,3}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

/// Nested objects and arrays with scalars at any depth.
fn document() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(
                (prop_oneof![mixed_case_name(), bracket_key()], inner),
                0..4
            )
            .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

#[derive(Debug, Clone)]
enum Part {
    Field(String),
    Index(usize),
    Key(String),
}

fn part() -> impl Strategy<Value = Part> {
    prop_oneof![
        mixed_case_name().prop_map(Part::Field),
        (0usize..4).prop_map(Part::Index),
        bracket_key().prop_map(Part::Key),
    ]
}

fn path_text(parts: &[Part]) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            Part::Field(name) => {
                if !text.is_empty() {
                    text.push('.');
                }
                text.push_str(name);
            }
            Part::Index(index) => text.push_str(&format!("[{}]", index)),
            Part::Key(key) => text.push_str(&format!("[{}]", key)),
        }
    }
    text
}

proptest! {
    #[test]
    fn injected_value_is_the_only_match(
        base in document(),
        parts in prop::collection::vec(part(), 1..5),
        value in document(),
    ) {
        let text = path_text(&parts);
        let expr = PathExpr::parse(&text).unwrap();
        let mut document = base;
        inject(&expr, &mut document, value.clone()).unwrap();

        let found: Vec<&Value> = evaluate(&expr, &document).into_iter().map(|m| m.value).collect();
        prop_assert_eq!(found, vec![&value], "path {} in {}", text, document);
        prop_assert_eq!(select(&expr, &document), Some(value));
    }

    #[test]
    fn injected_index_pads_with_null(index in 0usize..16, value in scalar()) {
        let expr = PathExpr::parse(&format!("items[{}]", index)).unwrap();
        let mut document = json!({});
        inject(&expr, &mut document, value.clone()).unwrap();

        let items = document["items"].as_array().unwrap();
        prop_assert_eq!(items.len(), index + 1);
        prop_assert!(items[..index].iter().all(Value::is_null));
        prop_assert_eq!(&items[index], &value);
    }

    #[test]
    fn empty_filter_keeps_body(ids in prop::collection::vec(any::<i64>(), 0..8)) {
        let body = json!({"ids": ids, "meta": {"count": ids.len()}});
        prop_assert_eq!(filter(&body, &[]).unwrap(), body.clone());
        prop_assert_eq!(filter(&body, &["*".to_string()]).unwrap(), body);
    }

    #[test]
    fn wildcard_projection_keeps_one_entry_per_element(
        ids in prop::collection::vec(any::<i64>(), 1..8)
    ) {
        let data: Vec<Value> = ids.iter().map(|id| json!({"id": id, "extra": true})).collect();
        let body = json!({"data": data, "total": ids.len()});

        let filtered = filter(&body, &["data[].id".to_string()]).unwrap();

        let expected: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
        prop_assert_eq!(filtered, json!({"data": expected}));
    }

    #[test]
    fn slice_selects_half_open_range(
        values in prop::collection::vec(any::<i32>(), 0..10),
        start in 0usize..12,
        len in 0usize..12,
    ) {
        let end = start + len;
        let body = json!({"items": values});
        let expr = PathExpr::parse(&format!("items[{}:{}]", start, end)).unwrap();

        let lo = start.min(values.len());
        let hi = end.min(values.len());
        let expected: Vec<Value> = values[lo..hi].iter().map(|v| json!(v)).collect();
        let selected = select(&expr, &body);
        if expected.is_empty() {
            prop_assert_eq!(selected, None);
        } else {
            prop_assert_eq!(selected, Some(Value::Array(expected)));
        }
    }
}
