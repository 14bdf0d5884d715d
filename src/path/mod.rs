//! Path expressions over structured documents.
//!
//! One small path language is shared by response filtering, value export and
//! request body field injection:
//!
//! ```text
//! field           case-insensitive object field
//! a.b             nested field
//! a[]             every element of an array
//! a[2] / a.2      element at an index
//! a[-1]           index counted from the end
//! a[1:3]          half-open slice, either bound optional
//! a[Content-Type] literal, case-sensitive key
//! ```
//!
//! Expressions are parsed with [`PathExpr::parse`], matched with [`evaluate`],
//! rebuilt into a smaller document with [`project`] and written with
//! [`inject`]. Evaluation never fails; a path that does not match simply
//! contributes nothing.

pub mod error;
pub mod eval;
pub mod inject;
pub mod parser;
pub mod project;

pub use error::PathError;
pub use eval::{evaluate, select, Match, Step};
pub use inject::inject;
pub use project::{filter, project};

use std::fmt;
use std::str::FromStr;

/// One segment of a parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object field, matched case-insensitively.
    Field(String),
    /// `[]`: every element of an array.
    Wildcard,
    /// `[n]` or a bare numeric segment; negative values count from the end.
    Index(i64),
    /// `[start:end]`, half-open, missing bounds default to the array edges.
    Slice {
        /// Inclusive start bound
        start: Option<i64>,
        /// Exclusive end bound
        end: Option<i64>,
    },
    /// `[key]`: exact, case-sensitive object key.
    Key(String),
}

impl Segment {
    /// Whether this segment can select more than one value.
    pub fn is_collection(&self) -> bool {
        matches!(self, Segment::Wildcard | Segment::Slice { .. })
    }
}

/// A parsed path expression.
///
/// Keeps the original text so errors and diagnostics can quote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parses path text into an expression.
    ///
    /// # Errors
    ///
    /// Returns `PathError::Parse` for empty paths, empty segments, unbalanced
    /// brackets and malformed slices.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let segments = parser::parse_segments(text)?;
        Ok(Self {
            source: text.trim().to_string(),
            segments,
        })
    }

    pub(crate) fn from_parts(source: String, segments: Vec<Segment>) -> Self {
        Self { source, segments }
    }

    /// The path text as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The parsed segments in evaluation order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the expression addresses at most one location, i.e. it
    /// contains no wildcard and no slice segment.
    pub fn is_concrete(&self) -> bool {
        !self.segments.iter().any(Segment::is_collection)
    }

    /// Name of the leading field segment, if the path starts with one.
    pub fn leading_field(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Field(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns the expression without its leading field segment.
    ///
    /// Yields `None` when the path does not start with a field or nothing
    /// would remain.
    pub fn tail(&self) -> Option<PathExpr> {
        let name = self.leading_field()?;
        if self.segments.len() < 2 {
            return None;
        }
        let rest = &self.source[name.len()..];
        let source = rest.strip_prefix('.').unwrap_or(rest).to_string();
        Some(Self::from_parts(source, self.segments[1..].to_vec()))
    }
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathExpr::parse(s)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
