//! # Parameter System
//!
//! This module provides the hierarchical parameter store and its derived-value
//! expression engine.
//!
//! ## Key Features
//!
//! - **Hierarchical Paths**: Parameters are addressed by `(main, sub, item)` triples
//! - **Bounded Literals**: Edits outside `[lower, upper]` are rejected, never clamped
//! - **Derived Parameters**: Values computed from a closed arithmetic grammar over other parameters
//! - **Cycle Protection**: Self-references fail with `CycleDetected`; long chains are capped
//! - **Cached Evaluation**: Derived results are memoized and invalidated along the dependency graph
//! - **Serialization Support**: Snapshots load atomically and serialize without computed values
//!
//! ## Core Components
//!
//! - [`ParameterStore`]: Owns the tree; reads effective values and commits literal edits
//! - [`ParameterTree`]: Ordered main → sub → item map of [`Parameter`]s
//! - [`Expression`]: Parse and evaluate derived-parameter expressions
//! - [`Resolver`] and [`DependencyGuard`]: Reference resolution with cycle and depth checks
//! - [`EvaluationCache`] and [`DependencyGraph`]: Memoized results and their invalidation
//!
//! ## Example Usage
//!
//! ```rust
//! use paramtree::parameters::{ParamPath, ParameterStore};
//!
//! let mut store = ParameterStore::from_json(r#"{
//!     "Env": {
//!         "Temp": {
//!             "Max": {"value": 80, "lower": 0, "upper": 120, "unit": 1, "help": "Upper limit"},
//!             "Margin": {"expr": "Env##Temp##Max - 5"}
//!         }
//!     }
//! }"#).unwrap();
//!
//! let max = ParamPath::new("Env", "Temp", "Max");
//! let margin = ParamPath::new("Env", "Temp", "Margin");
//!
//! // Derived parameters are read like literals
//! assert_eq!(store.get_effective_value(&margin).unwrap(), 75.0);
//!
//! // Only literals accept edits, and only within bounds
//! store.set_literal(&max, 100.0).unwrap();
//! assert_eq!(store.get_effective_value(&margin).unwrap(), 95.0);
//! assert!(store.set_literal(&max, 500.0).is_err());
//! assert!(store.set_literal(&margin, 1.0).is_err());
//! ```

pub mod bounds;
pub mod cache;
pub mod expression;
pub mod graph;
pub mod guard;
pub mod parameter;
pub mod path;
pub mod resolver;
pub mod store;
pub mod tree;


// Re-export key types
pub use bounds::Bounds;
pub use cache::EvaluationCache;
pub use expression::{
    BinaryOp, Expression, Resolve, UnaryOp, MAX_EXPRESSION_DEPTH, MAX_EXPRESSION_TERMS,
};
pub use graph::DependencyGraph;
pub use guard::DependencyGuard;
pub use parameter::{DerivedParam, LiteralParam, Parameter};
pub use path::{validate_segment, ParamPath, DELIMITER};
pub use resolver::{compile, Programs, Resolver};
pub use store::{Change, ParameterStore};
pub use tree::{CategorySummary, ItemMap, ParameterTree, SubCategoryMap};
