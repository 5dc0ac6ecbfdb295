//! Reference resolution against a parameter tree
//!
//! [`Resolver`] is the [`Resolve`] implementation the store evaluates with.
//! Literal targets answer directly; derived targets are evaluated recursively
//! under the caller's [`DependencyGuard`], consulting and filling the
//! evaluation cache when one is attached.

use crate::error::{ParamError, Result};
use crate::parameters::cache::EvaluationCache;
use crate::parameters::expression::{Expression, Resolve};
use crate::parameters::guard::DependencyGuard;
use crate::parameters::parameter::Parameter;
use crate::parameters::path::ParamPath;
use crate::parameters::tree::ParameterTree;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Parsed expression (or its syntax error) for every derived parameter
pub type Programs = HashMap<ParamPath, Result<Expression>>;

/// Parse every derived expression in `tree` once
pub fn compile(tree: &ParameterTree) -> Programs {
    tree.iter()
        .filter_map(|(path, param)| match param {
            Parameter::Derived(derived) => Some((path, Expression::parse(derived.expr()))),
            Parameter::Literal(_) => None,
        })
        .collect()
}

/// Resolves references by path within one tree
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    tree: &'a ParameterTree,
    programs: Option<&'a Programs>,
    cache: Option<&'a Mutex<EvaluationCache>>,
}

impl<'a> Resolver<'a> {
    /// Resolver that parses derived expressions on demand and caches nothing
    pub fn new(tree: &'a ParameterTree) -> Self {
        Self {
            tree,
            programs: None,
            cache: None,
        }
    }

    /// Use expressions parsed ahead of time
    pub fn with_programs(mut self, programs: &'a Programs) -> Self {
        self.programs = Some(programs);
        self
    }

    /// Read and fill `cache` for derived results
    pub fn with_cache(mut self, cache: &'a Mutex<EvaluationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Effective value of `path`, starting a fresh dependency chain
    pub fn evaluate(&self, path: &ParamPath, max_depth: usize) -> Result<f64> {
        let mut guard = DependencyGuard::new(max_depth);
        self.resolve(path, &mut guard)
    }

    /// Cached result of `path`, or evaluate it and remember the result
    ///
    /// A hit is charged its recorded height, so a read fails with
    /// `DepthExceeded` whenever a fresh evaluation would.
    fn get_or_eval(
        &self,
        path: &ParamPath,
        expr_text: &str,
        guard: &mut DependencyGuard,
    ) -> Result<f64> {
        if let Some((value, height)) = self.cached(path) {
            guard.reach(path, height)?;
            trace!("cache hit for {} (height {})", path, height);
            return Ok(value);
        }

        guard.enter(path)?;
        let (result, height) =
            guard.measure(|guard| self.evaluate_derived(path, expr_text, guard));
        guard.exit(path);

        let value = result?;
        if let Some(cache) = self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.clone(), value, height);
        }
        Ok(value)
    }

    fn evaluate_derived(
        &self,
        path: &ParamPath,
        expr_text: &str,
        guard: &mut DependencyGuard,
    ) -> Result<f64> {
        debug!("evaluating {} (depth {})", path, guard.depth());
        match self.programs.and_then(|programs| programs.get(path)) {
            Some(Ok(expr)) => expr.evaluate(self, guard),
            Some(Err(err)) => Err(err.clone()),
            None => Expression::parse(expr_text)?.evaluate(self, guard),
        }
    }

    fn cached(&self, path: &ParamPath) -> Option<(f64, usize)> {
        self.cache?
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(path)
    }
}

impl Resolve for Resolver<'_> {
    fn resolve(&self, path: &ParamPath, guard: &mut DependencyGuard) -> Result<f64> {
        match self.tree.get(path) {
            None => Err(ParamError::NotFound { path: path.clone() }),
            Some(Parameter::Literal(literal)) => Ok(literal.value()),
            Some(Parameter::Derived(derived)) => self.get_or_eval(path, derived.expr(), guard),
        }
    }
}
