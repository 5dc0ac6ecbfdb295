//! Configuration options for the parameter engine.
//!
//! This module defines the knobs that bound evaluation and control the
//! optional layers of a [`ParameterStore`](crate::parameters::ParameterStore).

use serde::{Deserialize, Serialize};

/// Default cap on the length of a reference chain.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default capacity of the recently-changed log.
pub const DEFAULT_RECENT_CHANGES: usize = 32;

/// Configuration options for a parameter store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of derived parameters resolved in one chain. Default: 64
    pub max_depth: usize,

    /// Whether derived results are memoized between reads. Default: true
    pub cache_enabled: bool,

    /// Number of committed edits kept for the recently-changed view. Default: 32
    pub recent_changes_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_enabled: true,
            recent_changes_limit: DEFAULT_RECENT_CHANGES,
        }
    }
}

impl EngineConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_recent_changes_limit(mut self, limit: usize) -> Self {
        self.recent_changes_limit = limit;
        self
    }
}
