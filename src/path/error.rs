//! Error types for path expressions.

use thiserror::Error;

/// Errors produced while parsing a path expression or injecting through one.
///
/// Evaluation never fails: a path that matches nothing simply yields no
/// matches. Only malformed syntax and invalid injection targets are errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path text does not follow the path grammar.
    #[error("invalid path '{path}': {reason} (at '{fragment}')")]
    Parse {
        /// The full path text as written
        path: String,
        /// The offending part of the path
        fragment: String,
        /// Human readable description of the problem
        reason: String,
    },

    /// The path cannot be used as a write target.
    #[error("cannot inject into '{path}': {reason}")]
    Injection {
        /// The full path text as written
        path: String,
        /// Human readable description of the problem
        reason: String,
    },
}

impl PathError {
    pub(crate) fn parse(path: &str, fragment: &str, reason: impl Into<String>) -> Self {
        PathError::Parse {
            path: path.to_string(),
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn injection(path: &str, reason: impl Into<String>) -> Self {
        PathError::Injection {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the path text the error refers to.
    pub fn path(&self) -> &str {
        match self {
            PathError::Parse { path, .. } => path,
            PathError::Injection { path, .. } => path,
        }
    }
}
