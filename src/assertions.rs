//! Response assertions.
//!
//! An assertion is `path=expected` or `path!=expected`. The path follows the
//! same rules as exports (`status`, `headers.x-id`, `body.user.name`, or a
//! bare body path) and the actual value is compared as text: strings as-is,
//! `null` and missing values as the empty string, everything else as compact
//! JSON.
//!
//! All assertions are evaluated; a run fails if any of them failed.

use crate::models::{value_to_text, HttpResponse};
use crate::path::{PathError, PathExpr};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("invalid assertion '{expression}': {reason}")]
    Malformed { expression: String, reason: String },

    #[error("invalid assertion path: {0}")]
    Path(#[from] PathError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertOp {
    Equals,
    NotEquals,
}

impl AssertOp {
    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            AssertOp::Equals => actual == expected,
            AssertOp::NotEquals => actual != expected,
        }
    }
}

/// A parsed assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    expression: String,
    path: PathExpr,
    op: AssertOp,
    expected: String,
}

impl Assertion {
    /// Parses `path=expected` or `path!=expected`.
    ///
    /// `!=` is recognised before `=`, and only the first operator splits, so
    /// the expected value may itself contain `=`.
    ///
    /// # Errors
    ///
    /// Returns `AssertionError::Malformed` without an operator or path, and
    /// `AssertionError::Path` if the path does not parse.
    pub fn parse(expression: &str) -> Result<Self, AssertionError> {
        let malformed = |reason: &str| AssertionError::Malformed {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let (path, op, expected) = if let Some((path, expected)) = expression.split_once("!=") {
            (path, AssertOp::NotEquals, expected)
        } else if let Some((path, expected)) = expression.split_once('=') {
            (path, AssertOp::Equals, expected)
        } else {
            return Err(malformed("expected '=' or '!='"));
        };

        let path = path.trim();
        if path.is_empty() {
            return Err(malformed("missing path"));
        }

        Ok(Self {
            expression: expression.to_string(),
            path: PathExpr::parse(path)?,
            op,
            expected: expected.trim().to_string(),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn op(&self) -> AssertOp {
        self.op
    }

    /// Checks the assertion against a response.
    pub fn evaluate(&self, response: &HttpResponse) -> AssertionResult {
        let actual = response
            .extract(&self.path)
            .map(|value| value_to_text(&value))
            .unwrap_or_default();
        AssertionResult {
            expression: self.expression.clone(),
            passed: self.op.holds(&actual, &self.expected),
            actual,
        }
    }
}

impl FromStr for Assertion {
    type Err = AssertionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Assertion::parse(s)
    }
}

/// Outcome of one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub expression: String,
    pub passed: bool,
    pub actual: String,
}

impl fmt::Display for AssertionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed {
            write!(f, "ASSERT PASSED: {}", self.expression)
        } else {
            write!(
                f,
                "ASSERT FAILED: {} (actual: {})",
                self.expression, self.actual
            )
        }
    }
}

/// Evaluates every assertion, in order.
pub fn evaluate_all(assertions: &[Assertion], response: &HttpResponse) -> Vec<AssertionResult> {
    assertions.iter().map(|a| a.evaluate(response)).collect()
}
