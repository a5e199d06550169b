//! Integration tests for Layer 2: Storage
//!
//! Tests for the script registry, local variables, and the catalog.

mod catalog;
mod local_vars;
mod registry;
