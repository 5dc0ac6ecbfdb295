//! Cycle and depth protection for recursive resolution
//!
//! One [`DependencyGuard`] lives for the duration of a single top-level
//! evaluation. Every derived parameter is entered before its expression is
//! evaluated and left afterwards, so the guard always holds exactly the chain
//! of parameters currently being resolved, in order.
//!
//! The guard also tracks the deepest level the evaluation has reached, so a
//! memoized result can report how many levels it stands for and be charged
//! against the depth cap exactly as a fresh evaluation would be.

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{ParamError, Result};
use crate::parameters::path::ParamPath;
use indexmap::IndexSet;

/// Ordered set of paths under resolution, with a cap on its length
#[derive(Debug, Clone)]
pub struct DependencyGuard {
    chain: IndexSet<ParamPath>,
    max_depth: usize,

    /// Deepest chain length reached so far
    peak: usize,
}

impl DependencyGuard {
    pub fn new(max_depth: usize) -> Self {
        Self {
            chain: IndexSet::new(),
            max_depth,
            peak: 0,
        }
    }

    /// Push `path` onto the chain
    ///
    /// Fails with `CycleDetected` if `path` is already being resolved, and with
    /// `DepthExceeded` if the chain is already at its limit.
    pub fn enter(&mut self, path: &ParamPath) -> Result<()> {
        if let Some(start) = self.chain.get_index_of(path) {
            let mut cycle: Vec<ParamPath> = self.chain.iter().skip(start).cloned().collect();
            cycle.push(path.clone());
            return Err(ParamError::CycleDetected {
                path: path.clone(),
                chain: cycle,
            });
        }

        if self.chain.len() >= self.max_depth {
            return Err(ParamError::DepthExceeded {
                path: path.clone(),
                limit: self.max_depth,
            });
        }

        self.chain.insert(path.clone());
        self.peak = self.peak.max(self.chain.len());
        Ok(())
    }

    /// Charge `height` levels resolved from memory at `path`
    ///
    /// Fails with `DepthExceeded` if resolving those levels below the current
    /// chain would have hit the cap.
    pub fn reach(&mut self, path: &ParamPath, height: usize) -> Result<()> {
        let deepest = self.chain.len() + height;
        if deepest > self.max_depth {
            return Err(ParamError::DepthExceeded {
                path: path.clone(),
                limit: self.max_depth,
            });
        }
        self.peak = self.peak.max(deepest);
        Ok(())
    }

    /// Run `f` for the path entered last and measure its height
    ///
    /// The height counts the entered path itself plus the longest chain of
    /// derived parameters resolved beneath it.
    pub fn measure<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> (T, usize) {
        let base = self.chain.len();
        let outer = std::mem::replace(&mut self.peak, base);
        let result = f(self);
        let height = self.peak + 1 - base;
        self.peak = self.peak.max(outer);
        (result, height)
    }

    /// Pop `path` off the chain
    pub fn exit(&mut self, path: &ParamPath) {
        debug_assert_eq!(self.chain.last(), Some(path));
        self.chain.pop();
    }

    /// Current chain, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &ParamPath> {
        self.chain.iter()
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for DependencyGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
