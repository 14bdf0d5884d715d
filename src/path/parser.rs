//! Path expression parser.
//!
//! The parser is a small hand written scanner rather than a split on `.`, so
//! bracket keys may contain dots (`headers[X.Trace.Id]`).

use super::error::PathError;
use super::Segment;

/// Parses path text into its segments.
///
/// Grammar: segments separated by `.`; each segment is an identifier followed
/// by zero or more `[...]` suffixes. The identifier may be omitted when at
/// least one bracket follows, which lets a path address a top-level array
/// (`[].id`). An identifier made only of digits is an index (`items.2`).
pub(crate) fn parse_segments(text: &str) -> Result<Vec<Segment>, PathError> {
    let source = text.trim();
    if source.is_empty() {
        return Err(PathError::parse(text, text, "path is empty"));
    }

    let mut segments = Vec::new();
    let mut pos = 0;

    loop {
        let start = pos;
        let ident_end = source[pos..]
            .find(['.', '[', ']'])
            .map(|offset| pos + offset)
            .unwrap_or(source.len());
        let ident = &source[pos..ident_end];
        pos = ident_end;

        if source[pos..].starts_with(']') {
            return Err(PathError::parse(
                source,
                &source[start..=pos],
                "unmatched ']'",
            ));
        }

        if !ident.is_empty() {
            segments.push(classify_identifier(ident));
        }

        let mut brackets = 0;
        while source[pos..].starts_with('[') {
            let close = match source[pos + 1..].find(']') {
                Some(offset) => pos + 1 + offset,
                None => {
                    return Err(PathError::parse(
                        source,
                        &source[pos..],
                        "unterminated bracket",
                    ))
                }
            };
            let inner = &source[pos + 1..close];
            if inner.contains('[') {
                return Err(PathError::parse(
                    source,
                    &source[pos..=close],
                    "nested '[' inside bracket",
                ));
            }
            segments.push(classify_bracket(source, inner)?);
            pos = close + 1;
            brackets += 1;
        }

        if ident.is_empty() && brackets == 0 {
            let fragment = if pos < source.len() { &source[start..=pos] } else { source };
            return Err(PathError::parse(source, fragment, "empty segment"));
        }

        if pos == source.len() {
            break;
        }

        match source[pos..].chars().next() {
            Some('.') => {
                pos += 1;
                if pos == source.len() {
                    return Err(PathError::parse(source, &source[start..], "trailing '.'"));
                }
            }
            Some(']') => {
                return Err(PathError::parse(source, &source[pos..], "unmatched ']'"));
            }
            _ => {
                return Err(PathError::parse(
                    source,
                    &source[pos..],
                    "expected '.' or '[' after ']'",
                ));
            }
        }
    }

    Ok(segments)
}

fn classify_identifier(ident: &str) -> Segment {
    if ident.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = ident.parse::<i64>() {
            return Segment::Index(index);
        }
    }
    Segment::Field(ident.to_string())
}

/// Classifies bracket contents: empty, integer, slice, then literal key.
fn classify_bracket(source: &str, inner: &str) -> Result<Segment, PathError> {
    if inner.is_empty() {
        return Ok(Segment::Wildcard);
    }

    if is_integer(inner) {
        return inner
            .parse::<i64>()
            .map(Segment::Index)
            .map_err(|_| PathError::parse(source, inner, "index out of range"));
    }

    if let Some((left, right)) = inner.split_once(':') {
        if !right.contains(':') {
            let left_ok = left.is_empty() || is_integer(left);
            let right_ok = right.is_empty() || is_integer(right);
            if left_ok && right_ok {
                return Ok(Segment::Slice {
                    start: parse_bound(source, left)?,
                    end: parse_bound(source, right)?,
                });
            }
            // One side reads as a slice bound, the other does not.
            if left_ok || right_ok {
                return Err(PathError::parse(
                    source,
                    &format!("[{}]", inner),
                    "slice bounds must be integers",
                ));
            }
        }
    }

    Ok(Segment::Key(inner.to_string()))
}

fn parse_bound(source: &str, bound: &str) -> Result<Option<i64>, PathError> {
    if bound.is_empty() {
        return Ok(None);
    }
    bound
        .parse::<i64>()
        .map(Some)
        .map_err(|_| PathError::parse(source, bound, "slice bound out of range"))
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
