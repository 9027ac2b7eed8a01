//! StudyMDR Store - SQLite persistence for study definitions and SoA snapshots
//!
//! Provides:
//! - Connection setup and embedded, checksummed migrations
//! - `SqliteStudyRepo`: the study aggregate via its memento
//! - `SqliteDesignRepo`: live and version-frozen flowchart selections
//! - Controlled-term labels for rendering
//! - SoA snapshot persistence with head pointers

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod snapshot;

// Re-export key types
pub use errors::Result;
pub use repo::{SqliteDesignRepo, SqliteStudyRepo};
