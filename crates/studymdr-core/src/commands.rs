//! Lifecycle commands for an existing study
//!
//! Creation is not a command: it has no prior state and needs a uid
//! generator, see `StudyDefinition::create`.

use crate::model::StudyMetadataPatch;

#[derive(Debug, Clone, PartialEq)]
pub enum StudyCommand {
    /// Merge field groups into the draft
    Edit { patch: StudyMetadataPatch },

    /// Publish the draft as the released copy
    Release { author: String },

    /// Freeze the draft as the next locked version
    Lock { description: String, author: String },

    /// Open a new draft from the last locked version
    Unlock,

    /// Soft-delete a never-locked study
    Delete,
}

impl StudyCommand {
    /// Operation name used in logs and error context
    pub fn op_name(&self) -> &'static str {
        match self {
            StudyCommand::Edit { .. } => "edit_study",
            StudyCommand::Release { .. } => "release_study",
            StudyCommand::Lock { .. } => "lock_study",
            StudyCommand::Unlock => "unlock_study",
            StudyCommand::Delete => "delete_study",
        }
    }
}
