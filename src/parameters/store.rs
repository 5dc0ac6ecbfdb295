//! The parameter store
//!
//! [`ParameterStore`] is the single owner of a [`ParameterTree`] and the only
//! place literal values change. It keeps the parsed derived expressions, their
//! dependency graph and the evaluation cache consistent with the tree, so
//! derived values always reflect the latest literal inputs.

use crate::config::EngineConfig;
use crate::error::{ParamError, Result, SerializationError};
use crate::parameters::cache::EvaluationCache;
use crate::parameters::expression::Expression;
use crate::parameters::graph::DependencyGraph;
use crate::parameters::guard::DependencyGuard;
use crate::parameters::parameter::Parameter;
use crate::parameters::path::ParamPath;
use crate::parameters::resolver::{compile, Programs, Resolver};
use crate::parameters::tree::ParameterTree;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// A committed literal edit
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: ParamPath,
    pub old: f64,
    pub new: f64,
}

/// Owns the parameter tree and everything derived from it
///
/// # Examples
///
/// ```
/// use paramtree::parameters::{ParamPath, ParameterStore};
///
/// let mut store = ParameterStore::from_json(r#"{"Env":{"Temp":{
///     "A":{"value":10,"lower":0,"upper":100,"unit":1,"help":""},
///     "B":{"expr":"Env##Temp##A * 2"}
/// }}}"#).unwrap();
///
/// let a = ParamPath::new("Env", "Temp", "A");
/// let b = ParamPath::new("Env", "Temp", "B");
/// assert_eq!(store.get_effective_value(&b).unwrap(), 20.0);
///
/// store.set_literal(&a, 15.0).unwrap();
/// assert_eq!(store.get_effective_value(&b).unwrap(), 30.0);
/// ```
#[derive(Debug, Default)]
pub struct ParameterStore {
    tree: ParameterTree,

    /// Tree as loaded, for [`ParameterStore::reset_all`]
    initial: ParameterTree,

    programs: Programs,
    graph: DependencyGraph,
    cache: Mutex<EvaluationCache>,
    recent: VecDeque<Change>,
    config: EngineConfig,
}

impl ParameterStore {
    /// Create an empty store with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create a store from a JSON snapshot
    pub fn from_json(snapshot: &str) -> Result<Self> {
        let mut store = Self::new();
        store.load(snapshot)?;
        Ok(store)
    }

    /// Create a store owning `tree`
    pub fn from_tree(tree: ParameterTree) -> Result<Self> {
        let mut store = Self::new();
        store.load_tree(tree)?;
        Ok(store)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &ParameterTree {
        &self.tree
    }

    /// Replace the whole tree with the parsed `snapshot`
    ///
    /// The new tree is built and validated completely before it is swapped
    /// in; on failure the current tree is left untouched.
    pub fn load(&mut self, snapshot: &str) -> Result<()> {
        let tree = ParameterTree::from_json(snapshot).map_err(|e| {
            warn!("rejected snapshot: {}", e);
            e
        })?;
        self.install(tree);
        Ok(())
    }

    /// Replace the whole tree with `tree`, after validating it
    pub fn load_tree(&mut self, tree: ParameterTree) -> Result<()> {
        tree.validate().map_err(|e| {
            warn!("rejected tree: {}", e);
            e
        })?;
        self.install(tree);
        Ok(())
    }

    fn install(&mut self, tree: ParameterTree) {
        let programs = compile(&tree);
        let graph = DependencyGraph::build(
            programs
                .iter()
                .filter_map(|(path, program)| program.as_ref().ok().map(|expr| (path, expr))),
        );

        debug!(
            "loaded {} parameters ({} derived, {} with syntax errors)",
            tree.len(),
            programs.len(),
            programs.values().filter(|p| p.is_err()).count()
        );

        self.initial = tree.clone();
        self.tree = tree;
        self.programs = programs;
        self.graph = graph;
        self.cache_mut().clear();
        self.recent.clear();
    }

    /// Metadata of the parameter at `path`
    pub fn get(&self, path: &ParamPath) -> Result<&Parameter> {
        self.tree
            .get(path)
            .ok_or_else(|| ParamError::NotFound { path: path.clone() })
    }

    /// Literal value, or the evaluated result of a derived expression
    pub fn get_effective_value(&self, path: &ParamPath) -> Result<f64> {
        self.resolver().evaluate(path, self.config.max_depth)
    }

    /// Effective value of every parameter, in display order
    ///
    /// Parameters are evaluated in parallel against the current state; each
    /// entry carries its own result so one broken expression does not hide
    /// the others.
    pub fn evaluate_all(&self) -> Vec<(ParamPath, Result<f64>)> {
        self.tree
            .paths()
            .into_par_iter()
            .map(|path| {
                let result = self.get_effective_value(&path);
                if let Err(e) = &result {
                    warn!("{} cannot be evaluated: {}", path, e);
                }
                (path, result)
            })
            .collect()
    }

    /// Evaluate ad hoc expression text against the current values
    pub fn evaluate_expression(&self, text: &str) -> Result<f64> {
        let expr = Expression::parse(text)?;
        let mut guard = DependencyGuard::new(self.config.max_depth);
        expr.evaluate(&self.resolver(), &mut guard)
    }

    /// Check expression text without evaluating it
    ///
    /// # Returns
    ///
    /// The paths the expression references, or its syntax error
    pub fn validate_expression(&self, text: &str) -> Result<Vec<ParamPath>> {
        Ok(Expression::parse(text)?.references())
    }

    /// Commit a new literal value
    ///
    /// Fails with `NotFound` if `path` does not name a literal and with
    /// `OutOfBounds` if `value` lies outside its declared range. On success
    /// every cached result that could depend on `path` is dropped.
    pub fn set_literal(&mut self, path: &ParamPath, value: f64) -> Result<()> {
        let old = match self.tree.get_mut(path) {
            None => return Err(ParamError::NotFound { path: path.clone() }),
            Some(Parameter::Derived(_)) => {
                return Err(ParamError::NotLiteral { path: path.clone() })
            }
            Some(Parameter::Literal(literal)) => literal.set_value(path, value)?,
        };

        let graph = &self.graph;
        self.cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidate(path, graph);

        info!("{}: {} -> {}", path, old, value);
        self.record(Change {
            path: path.clone(),
            old,
            new: value,
        });
        Ok(())
    }

    fn record(&mut self, change: Change) {
        let limit = self.config.recent_changes_limit;
        if limit == 0 {
            return;
        }
        while self.recent.len() >= limit {
            self.recent.pop_front();
        }
        self.recent.push_back(change);
    }

    /// Committed edits since the last load, oldest first
    pub fn recent_changes(&self) -> impl Iterator<Item = &Change> {
        self.recent.iter()
    }

    /// Restore every literal to its value at load time
    pub fn reset_all(&mut self) {
        self.tree = self.initial.clone();
        self.cache_mut().clear();
        self.recent.clear();
        debug!("reset {} parameters to their loaded values", self.tree.len());
    }

    /// Derived parameters whose value depends on `path`, nearest first
    pub fn dependents(&self, path: &ParamPath) -> Vec<ParamPath> {
        self.graph.transitive_dependents(path)
    }

    /// Paths referenced directly by the expression at `path`
    ///
    /// Literals have no dependencies. A derived parameter whose expression
    /// does not parse fails with its syntax error.
    pub fn dependencies(&self, path: &ParamPath) -> Result<Vec<ParamPath>> {
        match self.get(path)? {
            Parameter::Literal(_) => Ok(Vec::new()),
            Parameter::Derived(_) => match self.programs.get(path) {
                Some(Err(err)) => Err(err.clone()),
                _ => Ok(self.graph.dependencies(path).to_vec()),
            },
        }
    }

    /// Number of derived results currently memoized
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Serialize the tree in the persisted layout
    ///
    /// Derived parameters are written as their expression only; computed
    /// values never appear in the output.
    pub fn serialize(&self) -> std::result::Result<String, SerializationError> {
        self.tree.to_json()
    }

    /// Load a snapshot from a JSON file
    pub fn load_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> std::result::Result<(), SerializationError> {
        let contents = fs::read_to_string(path)?;
        self.load(&contents)?;
        Ok(())
    }

    /// Save the serialized tree to a JSON file
    pub fn save_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> std::result::Result<(), SerializationError> {
        fs::write(path, self.serialize()?)?;
        Ok(())
    }

    fn resolver(&self) -> Resolver<'_> {
        let resolver = Resolver::new(&self.tree).with_programs(&self.programs);
        if self.config.cache_enabled {
            resolver.with_cache(&self.cache)
        } else {
            resolver
        }
    }

    fn cache_mut(&mut self) -> &mut EvaluationCache {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}
