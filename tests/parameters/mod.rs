//! Integration tests for the parameter system
//!
//! These tests verify that the parameter system behaves correctly in various scenarios.

// Tests for path handling and the parameter tree
mod tree_tests;


// Tests for the ParameterStore read/write surface
mod store_tests;
