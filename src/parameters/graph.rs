//! Dependency graph between derived parameters and the paths they reference
//!
//! Edges are computed once from each parsed expression when a tree is
//! installed. The graph is independent of the per-call dependency chain: it
//! records what *could* be read, not what is being read right now.

use crate::parameters::expression::Expression;
use crate::parameters::path::ParamPath;
use indexmap::IndexSet;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Derived parameter -> paths its expression references
    dependencies: HashMap<ParamPath, Vec<ParamPath>>,

    /// Referenced path -> derived parameters whose expressions name it
    dependents: HashMap<ParamPath, IndexSet<ParamPath>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from parsed expressions keyed by the owning path
    pub fn build<'a, I>(programs: I) -> Self
    where
        I: IntoIterator<Item = (&'a ParamPath, &'a Expression)>,
    {
        let mut graph = Self::new();
        for (path, expr) in programs {
            graph.add(path.clone(), expr.references());
        }
        graph
    }

    /// Record that `path` reads each of `references`
    pub fn add(&mut self, path: ParamPath, references: Vec<ParamPath>) {
        for reference in &references {
            self.dependents
                .entry(reference.clone())
                .or_default()
                .insert(path.clone());
        }
        self.dependencies.insert(path, references);
    }

    /// Paths referenced directly by `path`'s expression
    pub fn dependencies(&self, path: &ParamPath) -> &[ParamPath] {
        self.dependencies
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Derived parameters whose expressions reference `path` directly
    pub fn direct_dependents(&self, path: &ParamPath) -> impl Iterator<Item = &ParamPath> {
        self.dependents.get(path).into_iter().flatten()
    }

    /// Every derived parameter that transitively reads `path`
    ///
    /// Breadth-first, nearest dependents first. `path` itself is only included
    /// when it sits on a cycle.
    pub fn transitive_dependents(&self, path: &ParamPath) -> Vec<ParamPath> {
        let mut seen: IndexSet<ParamPath> = IndexSet::new();
        let mut queue: VecDeque<&ParamPath> = VecDeque::new();
        queue.push_back(path);

        while let Some(current) = queue.pop_front() {
            for dependent in self.direct_dependents(current) {
                if seen.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }

        seen.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}
