//! Integration tests for Layer 1: Language
//!
//! Tests for image assembly, loading, disassembly, and execution.

mod images;
mod vm;
