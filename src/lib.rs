//! # paramtree
//!
//! `paramtree` presents and edits a hierarchical set of numeric configuration
//! parameters. Some parameters are bounded literal values; others are derived
//! from an arithmetic expression over parameters elsewhere in the hierarchy.
//!
//! The library provides:
//! - An ordered `main → sub → item` parameter tree loaded from and saved to JSON
//! - A closed arithmetic expression grammar with cross-references by path
//! - Recursive evaluation with cycle detection and a depth cap
//! - Memoized derived values, invalidated when an upstream literal changes
//!
//! ## Basic Usage
//!
//! ```
//! use paramtree::{ParamPath, ParameterStore};
//!
//! let mut store = ParameterStore::from_json(
//!     r#"{"Env":{"Temp":{"A":{"value":10,"lower":0,"upper":100,"unit":1,"help":""},"B":{"expr":"Env##Temp##A * 2"}}}}"#,
//! )
//! .unwrap();
//!
//! let a = ParamPath::new("Env", "Temp", "A");
//! let b = ParamPath::new("Env", "Temp", "B");
//! assert_eq!(store.get_effective_value(&b).unwrap(), 20.0);
//!
//! store.set_literal(&a, 15.0).unwrap();
//! assert_eq!(store.get_effective_value(&b).unwrap(), 30.0);
//! ```

// Public modules
pub mod config;
pub mod error;

// Parameter system
pub mod parameters;

// Re-exports for convenience
pub use config::EngineConfig;
pub use error::{ErrorKind, ParamError, Result, SerializationError};
pub use parameters::{Parameter, ParamPath, ParameterStore, ParameterTree};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
