//! Errors raised while planning or running a chain.

use crate::assertions::AssertionError;
use crate::executor::RequestError;
use crate::path::PathError;
use crate::snapshot::SnapshotError;
use crate::template::TemplateError;
use crate::variables::VarError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// `depends` entries form a loop. `cycle` starts and ends with the same
    /// template.
    #[error("Circular dependency detected: {}", .cycle.join(" → "))]
    CircularDependency { cycle: Vec<String> },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Variable(#[from] VarError),

    #[error("template '{template}': {source}")]
    Path {
        template: String,
        #[source]
        source: PathError,
    },

    #[error("template '{template}': invalid URL '{url}': {reason}")]
    InvalidUrl {
        template: String,
        url: String,
        reason: String,
    },

    #[error("template '{template}': form file '{}' not found", .path.display())]
    FormFile { template: String, path: PathBuf },

    #[error("invalid export '{spec}': {reason}")]
    InvalidExport { spec: String, reason: String },

    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// The request for a step could not be completed.
    #[error("request for '{template}' failed: {source}")]
    Request {
        template: String,
        #[source]
        source: RequestError,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("failed to write diagnostics: {0}")]
    Diagnostics(#[from] std::io::Error),
}

impl ChainError {
    /// Attaches the template name to a path error.
    pub(crate) fn path(template: &str) -> impl FnOnce(PathError) -> ChainError + '_ {
        move |source| ChainError::Path {
            template: template.to_string(),
            source,
        }
    }

    /// True for errors detected before any request is sent.
    pub fn is_resolution_error(&self) -> bool {
        !matches!(
            self,
            ChainError::Request { .. } | ChainError::Diagnostics(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = ChainError::CircularDependency {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a → b → a");
        assert!(err.is_resolution_error());
    }

    #[test]
    fn test_path_error_names_template() {
        let source = crate::path::PathExpr::parse("items[1:").unwrap_err();
        let err = ChainError::path("create-user")(source);
        let message = err.to_string();
        assert!(message.starts_with("template 'create-user': "));
        assert!(message.contains("items[1:"));
    }

    #[test]
    fn test_request_error_is_not_resolution() {
        let err = ChainError::Request {
            template: "login".to_string(),
            source: RequestError::NetworkError("refused".to_string()),
        };
        assert!(!err.is_resolution_error());
        assert_eq!(
            err.to_string(),
            "request for 'login' failed: Network error: refused"
        );
    }
}
