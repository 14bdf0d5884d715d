//! Path evaluation.

use super::{PathExpr, Segment};
use serde_json::{Map, Value};

/// One step of a match location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Object key, using the key's spelling in the source document.
    Key(String),
    /// Array element.
    Index {
        /// Position of the element in the source array.
        source: usize,
        /// Position the element takes when the match is projected. Wildcards
        /// and concrete indices keep the source position; slices and negative
        /// indices are packed from zero.
        slot: usize,
    },
}

/// A value selected by a path, together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub location: Vec<Step>,
    pub value: &'a Value,
}

/// Evaluates a path against a document.
///
/// Returns every match in document order. Missing fields, out of range
/// indices and type mismatches contribute nothing; evaluation never fails.
pub fn evaluate<'a>(expr: &PathExpr, document: &'a Value) -> Vec<Match<'a>> {
    let mut candidates = vec![Match {
        location: Vec::new(),
        value: document,
    }];

    for segment in expr.segments() {
        let mut next = Vec::new();
        for candidate in candidates {
            expand(segment, candidate, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        candidates = next;
    }

    candidates
}

/// Selects a single value for export or assertion.
///
/// Concrete paths yield their first match. Paths with a wildcard or slice
/// yield an array of all matched values. `None` when nothing matched.
pub fn select(expr: &PathExpr, document: &Value) -> Option<Value> {
    let matches = evaluate(expr, document);
    if matches.is_empty() {
        return None;
    }
    if expr.is_concrete() {
        return matches.into_iter().next().map(|m| m.value.clone());
    }
    Some(Value::Array(
        matches.into_iter().map(|m| m.value.clone()).collect(),
    ))
}

fn expand<'a>(segment: &Segment, candidate: Match<'a>, out: &mut Vec<Match<'a>>) {
    let Match { location, value } = candidate;

    let push = |out: &mut Vec<Match<'a>>, step: Step, child: &'a Value| {
        let mut location = location.clone();
        location.push(step);
        out.push(Match {
            location,
            value: child,
        });
    };

    match segment {
        Segment::Field(name) => {
            if let Value::Object(map) = value {
                if let Some((key, child)) = find_field(map, name) {
                    push(out, Step::Key(key.clone()), child);
                }
            }
        }
        Segment::Key(key) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get(key.as_str()) {
                    push(out, Step::Key(key.clone()), child);
                }
            }
        }
        Segment::Wildcard => {
            if let Value::Array(items) = value {
                for (index, child) in items.iter().enumerate() {
                    push(
                        out,
                        Step::Index {
                            source: index,
                            slot: index,
                        },
                        child,
                    );
                }
            }
        }
        Segment::Index(index) => {
            if let Value::Array(items) = value {
                if let Some(resolved) = resolve_index(*index, items.len()) {
                    let slot = if *index < 0 { 0 } else { resolved };
                    push(
                        out,
                        Step::Index {
                            source: resolved,
                            slot,
                        },
                        &items[resolved],
                    );
                }
            }
        }
        Segment::Slice { start, end } => {
            if let Value::Array(items) = value {
                let (from, to) = resolve_slice(*start, *end, items.len());
                for index in from..to {
                    push(
                        out,
                        Step::Index {
                            source: index,
                            slot: index - from,
                        },
                        &items[index],
                    );
                }
            }
        }
    }
}

/// Finds an object field case-insensitively. The first matching key in
/// document order wins.
pub(crate) fn find_field<'m>(
    map: &'m Map<String, Value>,
    name: &str,
) -> Option<(&'m String, &'m Value)> {
    map.iter().find(|(key, _)| field_matches(key, name))
}

pub(crate) fn field_matches(key: &str, name: &str) -> bool {
    key.eq_ignore_ascii_case(name) || key.to_lowercase() == name.to_lowercase()
}

pub(crate) fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    if resolved >= 0 && resolved < len {
        Some(resolved as usize)
    } else {
        None
    }
}

fn resolve_slice(start: Option<i64>, end: Option<i64>, len: usize) -> (usize, usize) {
    let len = len as i64;
    let clamp = |bound: i64| -> i64 {
        let bound = if bound < 0 { len + bound } else { bound };
        bound.clamp(0, len)
    };
    let from = start.map(clamp).unwrap_or(0);
    let to = end.map(clamp).unwrap_or(len);
    if from >= to {
        (0, 0)
    } else {
        (from as usize, to as usize)
    }
}
