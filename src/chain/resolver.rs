//! Dependency resolution.
//!
//! Depth-first walk over `depends`, producing each template after all of its
//! dependencies. A template reached twice (a diamond) keeps its first
//! position; a template reached while it is still being visited is a cycle.

use super::error::ChainError;
use crate::template::{Template, TemplateSource};
use indexmap::{IndexMap, IndexSet};
use log::debug;

/// One entry of an execution plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// The name the template was requested by.
    pub name: String,
    pub template: Template,
}

/// Templates in execution order; the requested template is last.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    dependencies: Vec<PlanStep>,
    root: PlanStep,
}

impl ExecutionPlan {
    /// All steps, dependencies first.
    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.dependencies.iter().chain(std::iter::once(&self.root))
    }

    /// Steps that run before the root.
    pub fn dependencies(&self) -> &[PlanStep] {
        &self.dependencies
    }

    /// The originally requested template.
    pub fn root(&self) -> &PlanStep {
        &self.root
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps().map(|s| s.name.as_str()).collect()
    }
}

/// Resolves the plan for the template called `name`.
///
/// # Errors
///
/// Returns `ChainError::CircularDependency` for dependency loops and
/// `ChainError::Template` when a template cannot be loaded.
pub fn resolve_plan(name: &str, source: &dyn TemplateSource) -> Result<ExecutionPlan, ChainError> {
    let root = source.load(name)?;
    resolve_plan_for(name, root, source)
}

/// Resolves the plan for an already loaded root template.
pub fn resolve_plan_for(
    name: &str,
    root: Template,
    source: &dyn TemplateSource,
) -> Result<ExecutionPlan, ChainError> {
    let mut resolver = Resolver {
        source,
        stack: IndexSet::new(),
        resolved: IndexMap::new(),
    };
    resolver.stack.insert(name.to_string());
    for dependency in &root.depends {
        resolver.visit(dependency)?;
    }

    let dependencies: Vec<PlanStep> = resolver
        .resolved
        .into_iter()
        .map(|(name, template)| PlanStep { name, template })
        .collect();
    let plan = ExecutionPlan {
        dependencies,
        root: PlanStep {
            name: name.to_string(),
            template: root,
        },
    };
    debug!("execution plan: {}", plan.names().join(" -> "));
    Ok(plan)
}

struct Resolver<'a> {
    source: &'a dyn TemplateSource,
    /// Names currently being visited, outermost first.
    stack: IndexSet<String>,
    resolved: IndexMap<String, Template>,
}

impl Resolver<'_> {
    fn visit(&mut self, name: &str) -> Result<(), ChainError> {
        if self.resolved.contains_key(name) {
            return Ok(());
        }
        if let Some(start) = self.stack.get_index_of(name) {
            let mut cycle: Vec<String> = self.stack.iter().skip(start).cloned().collect();
            cycle.push(name.to_string());
            return Err(ChainError::CircularDependency { cycle });
        }

        let template = self.source.load(name)?;
        self.stack.insert(name.to_string());
        for dependency in &template.depends {
            self.visit(dependency)?;
        }
        self.stack.pop();
        self.resolved.insert(name.to_string(), template);
        Ok(())
    }
}
