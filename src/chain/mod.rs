//! Request chaining.
//!
//! A template may declare `depends: [...]`; running it runs its
//! dependencies first, in an order where every template follows everything
//! it depends on. Values a step `exports` become variables for every later
//! step.
//!
//! Variable precedence, highest first:
//!
//! 1. `-v name=value` from the command line
//! 2. exports of earlier steps (a later export replaces an earlier one)
//! 3. the environment, through `{{env.NAME}}`

pub mod error;
pub mod exports;
pub mod resolver;
pub mod runner;

pub use error::ChainError;
pub use exports::{export_line, shell_quote, ExportSpec, EXPORT_PREFIX};
pub use resolver::{resolve_plan, resolve_plan_for, ExecutionPlan, PlanStep};
pub use runner::{ChainOutcome, ChainRunner, RunOptions};
