//! Mapscript - Embedded map scripting runtime
//!
//! This crate re-exports all layers of the mapscript system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: mapscript_runtime    - Map saves, snapshots, CLI
//! Layer 3: mapscript_engine     - Trigger dispatch, timed events, requests
//! Layer 2: mapscript_storage    - Script registry, local variables, catalog
//! Layer 1: mapscript_language   - Bytecode images, interpreter
//! Layer 0: mapscript_foundation - Core types (ScriptId, Value, Error)
//! ```

pub use mapscript_engine as engine;
pub use mapscript_foundation as foundation;
pub use mapscript_language as language;
pub use mapscript_runtime as runtime;
pub use mapscript_storage as storage;
