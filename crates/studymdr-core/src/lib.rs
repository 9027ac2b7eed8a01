//! StudyMDR Core - study definition versioning and Schedule of Activities
//!
//! This crate holds the pure domain of the study repository:
//! - Study metadata value objects and the versioned `StudyDefinition`
//!   aggregate (draft / released / locked, soft delete)
//! - Memento serialization of the aggregate
//! - Controlled-term validation through an injected `ValidationContext`
//! - Study design selections and the SoA table builder with hidden-row
//!   propagation
//! - Frozen SoA snapshots (cell and footnote references) and their digest
//!
//! Persistence lives in `studymdr-store`, orchestration in `studymdr-engine`.

pub mod apply;
pub mod commands;
pub mod errors;
pub mod flowchart;
pub mod logging_facility;
pub mod model;
pub mod rules;
pub mod snapshot;
pub mod uid;

// Re-export commonly used types
pub use apply::apply;
pub use commands::StudyCommand;
pub use errors::{ExError, ExErrorKind, Result, StudyError};
pub use model::{StudyDefinition, StudyMetadata, StudyStatus};
pub use rules::{PermissiveValidationContext, ValidationContext};
pub use uid::UidGenerator;
