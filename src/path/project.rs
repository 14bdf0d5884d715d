//! Projection of matches back into a document, and body filtering.

use super::eval::{evaluate, Match, Step};
use super::{PathError, PathExpr};
use serde_json::{Map, Value};

/// Field list entry that disables filtering.
pub const PASSTHROUGH: &str = "*";

/// Rebuilds a document containing only the matched locations.
///
/// Each match is written at the same shape it had in the source: objects stay
/// objects and array elements keep their slot (see [`Step::Index`]). Missing
/// array slots are padded with `null`. When two matches land on the same
/// location and both values are objects they are merged key by key;
/// otherwise the later match replaces the earlier one.
pub fn project(matches: &[Match<'_>]) -> Value {
    let mut output = Value::Null;
    for m in matches {
        place(&mut output, &m.location, m.value.clone());
    }
    output
}

/// Filters a response body down to the given field paths.
///
/// An empty list, or a list containing `*`, returns the body unchanged.
/// Bodies that are not objects or arrays pass through untouched. Results of
/// several paths are merged into one document in list order.
///
/// # Errors
///
/// Returns `PathError::Parse` if any field path is malformed.
pub fn filter(body: &Value, fields: &[String]) -> Result<Value, PathError> {
    if fields.is_empty() || fields.iter().any(|f| f.trim() == PASSTHROUGH) {
        return Ok(body.clone());
    }
    if !body.is_object() && !body.is_array() {
        return Ok(body.clone());
    }

    let exprs = fields
        .iter()
        .map(|field| PathExpr::parse(field))
        .collect::<Result<Vec<_>, _>>()?;

    let mut output = Value::Null;
    for expr in &exprs {
        for m in evaluate(expr, body) {
            place(&mut output, &m.location, m.value.clone());
        }
    }

    if output.is_null() {
        output = if body.is_array() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }
    Ok(output)
}

fn place(slot: &mut Value, steps: &[Step], value: Value) {
    match steps.split_first() {
        None => merge(slot, value),
        Some((Step::Key(key), rest)) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                place(child, rest, value);
            }
        }
        Some((Step::Index { slot: index, .. }, rest)) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                place(&mut items[*index], rest, value);
            }
        }
    }
}

fn merge(slot: &mut Value, value: Value) {
    match (slot, value) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, incoming_value) in incoming {
                match existing.get_mut(&key) {
                    Some(current) => merge(current, incoming_value),
                    None => {
                        existing.insert(key, incoming_value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
