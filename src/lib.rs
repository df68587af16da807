//! Memory Match (workspace facade crate).
//!
//! Re-exports the workspace crates under one name, plus the pieces of the
//! console binary that are worth testing on their own.

pub mod cli;
pub mod console;
pub mod telemetry;

pub use memory_match_adapter as adapter;
pub use memory_match_core as core;
pub use memory_match_engine as engine;
pub use memory_match_types as types;
