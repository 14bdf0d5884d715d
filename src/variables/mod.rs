//! Variables and placeholder interpolation.
//!
//! A [`VariableTable`] holds the named values visible to one chain run. It is
//! created when the run starts, grows as each step exports values and is
//! dropped when the run ends. [`Interpolator`] expands `{{...}}` placeholders
//! against it.

pub mod environment;
pub mod substitution;
pub mod system;

pub use environment::expand_env_refs;
pub use substitution::{map_strings, Interpolator};
pub use system::resolve_builtin;

use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised while expanding placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarError {
    /// A placeholder referenced a variable that is not defined.
    #[error("missing variable '{{{{{token}}}}}' in template '{template}'")]
    MissingVariable {
        /// The placeholder contents, e.g. `token` or `env.API_KEY`
        token: String,
        /// Name of the template being interpolated
        template: String,
    },
}

/// Where a variable's value came from.
///
/// Sources are ordered by precedence: a value from a higher source is never
/// replaced by one from a lower source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provenance {
    /// Lowest rank. Environment values are read through `{{env.NAME}}` and
    /// never stored in a chain's table; the variant only fixes the ordering.
    Environment,
    /// Exported by a step that already ran in this chain.
    DependencyExport,
    /// Passed on the command line with `-v name=value`.
    CliFlag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    value: String,
    provenance: Provenance,
}

/// Named variables for one chain run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    entries: IndexMap<String, Entry>,
}

impl VariableTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table seeded with command-line variables.
    pub fn from_cli<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (name, value) in vars {
            table.insert(name, value, Provenance::CliFlag);
        }
        table
    }

    /// Inserts a value unless a higher-precedence source already defines the
    /// name. Returns whether the value was stored.
    ///
    /// A value from the same source replaces the previous one, so a later
    /// export of a name wins over an earlier export.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        provenance: Provenance,
    ) -> bool {
        let name = name.into();
        if let Some(existing) = self.entries.get(&name) {
            if existing.provenance > provenance {
                return false;
            }
        }
        self.entries.insert(
            name,
            Entry {
                value: value.into(),
                provenance,
            },
        );
        true
    }

    /// Merges a value exported by a finished step.
    pub fn merge_export(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        self.insert(name, value, Provenance::DependencyExport)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|e| e.value.as_str())
    }

    pub fn provenance(&self, name: &str) -> Option<Provenance> {
        self.entries.get(name).map(|e| e.provenance)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.value.as_str()))
    }
}
