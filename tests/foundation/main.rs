//! Integration tests for Layer 0: Foundation
//!
//! Tests for script ids, tiles, time, values, and errors.

mod errors;
mod identifiers;
mod values;
