//! Integration tests for Layer 3: Engine
//!
//! Tests for trigger dispatch, inter-script calls, and the frame driver,
//! with scripts loaded from disk.

mod frames;
mod harness;
mod scripts;
mod triggers;
