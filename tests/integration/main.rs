//! Integration tests across all layers
//!
//! Scripts compiled to disk, run by the scheduler, and carried through map
//! saves and snapshots.

mod persistence;
mod session;
mod support;
