//! Memoized results of derived parameters
//!
//! Only successful evaluations are stored. An entry stays valid until a
//! literal it transitively depends on is written, at which point
//! [`EvaluationCache::invalidate`] drops it along with every other entry the
//! dependency graph says could observe the change.
//!
//! Each entry also remembers its height, the number of derived levels its
//! evaluation resolved, so a hit can still be checked against the depth cap.

use crate::parameters::graph::DependencyGraph;
use crate::parameters::path::ParamPath;
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedValue {
    value: f64,
    height: usize,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationCache {
    values: HashMap<ParamPath, CachedValue>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &ParamPath) -> Option<f64> {
        self.values.get(path).map(|cached| cached.value)
    }

    /// Cached value of `path` together with its height
    pub fn lookup(&self, path: &ParamPath) -> Option<(f64, usize)> {
        self.values
            .get(path)
            .map(|cached| (cached.value, cached.height))
    }

    pub fn insert(&mut self, path: ParamPath, value: f64, height: usize) {
        self.values.insert(path, CachedValue { value, height });
    }

    /// Drop the entry for `path` and for everything that depends on it
    ///
    /// # Returns
    ///
    /// The number of entries removed
    pub fn invalidate(&mut self, path: &ParamPath, graph: &DependencyGraph) -> usize {
        let mut removed = usize::from(self.values.remove(path).is_some());
        for dependent in graph.transitive_dependents(path) {
            if self.values.remove(&dependent).is_some() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!("invalidated {} cached value(s) downstream of {}", removed, path);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, path: &ParamPath) -> bool {
        self.values.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
