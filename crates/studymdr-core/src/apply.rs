//! Functional-boundary entry point for study lifecycle commands
//!
//! `apply()` takes the aggregate by value and hands back the mutated one.
//! On error the caller's previously cloned copy is still the last valid
//! state; nothing is half-applied because every operation checks its
//! preconditions before touching the aggregate.
//!
//! ```
//! use studymdr_core::apply::apply;
//! use studymdr_core::commands::StudyCommand;
//! use studymdr_core::model::{StudyFields, StudyStatus, StudyDefinition};
//! use studymdr_core::rules::PermissiveValidationContext;
//!
//! let ctx = PermissiveValidationContext::new();
//! let mut fields = StudyFields::default();
//! fields.identification.project_number = Some("PRJ-1".to_string());
//! fields.identification.study_number = Some("0001".to_string());
//! let study = StudyDefinition::create(fields, &ctx, &|| "Study_000001".to_string()).unwrap();
//!
//! let cmd = StudyCommand::Lock { description: "v1".to_string(), author: "alice".to_string() };
//! let study = apply(study, cmd, &ctx).unwrap();
//! assert_eq!(study.current_status().unwrap(), StudyStatus::Locked);
//! ```

use crate::commands::StudyCommand;
use crate::errors::Result;
use crate::model::StudyDefinition;
use crate::rules::ValidationContext;

/// Apply `cmd` to `study`
///
/// # Errors
/// Whatever the underlying aggregate operation raises; see `StudyError`.
pub fn apply(
    mut study: StudyDefinition,
    cmd: StudyCommand,
    ctx: &dyn ValidationContext,
) -> Result<StudyDefinition> {
    match cmd {
        StudyCommand::Edit { patch } => study.edit(patch, ctx)?,
        StudyCommand::Release { author } => study.release(&author)?,
        StudyCommand::Lock {
            description,
            author,
        } => {
            study.lock(&description, &author)?;
        }
        StudyCommand::Unlock => study.unlock()?,
        StudyCommand::Delete => study.mark_deleted()?,
    }
    Ok(study)
}
