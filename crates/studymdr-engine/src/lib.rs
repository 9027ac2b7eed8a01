//! StudyMDR Engine - orchestration layer
//!
//! Runs study lifecycle and flowchart operations against a SQLite store.
//! Each operation is one transaction; locking a study also freezes its
//! design and writes the SoA snapshots of every layout in that same
//! transaction.

pub mod commands;
pub mod config;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use config::EngineConfig;
