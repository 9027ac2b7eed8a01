//! Engine-level commands that require I/O (database).

#![allow(clippy::result_large_err)]

use crate::commands::flowchart::{save_study_design, update_soa_snapshot};
use crate::commands::study::{
    create_study, delete_study, edit_study, lock_study, release_study, unlock_study, LockedStudy,
};
use rusqlite::Connection;
use studymdr_core::flowchart::{SoALayout, StudyDesign};
use studymdr_core::model::{StudyFields, StudyMetadataPatch};
use studymdr_core::rules::ValidationContext;
use studymdr_core::StudyDefinition;
use studymdr_core_types::RequestContext;
use studymdr_store::snapshot::SoASnapshotRow;
use studymdr_store::Result;

/// Writes the engine performs against the store
#[derive(Debug, Clone)]
pub enum EngineCommand {
    CreateStudy {
        fields: StudyFields,
    },
    EditStudy {
        study_uid: String,
        patch: StudyMetadataPatch,
    },
    ReleaseStudy {
        study_uid: String,
    },
    /// Lock and snapshot every SoA layout
    LockStudy {
        study_uid: String,
        description: String,
    },
    UnlockStudy {
        study_uid: String,
    },
    DeleteStudy {
        study_uid: String,
    },
    SaveStudyDesign {
        design: StudyDesign,
    },
    /// Backfill the snapshot of one locked version
    UpdateSoASnapshot {
        study_uid: String,
        version: u32,
        layout: SoALayout,
    },
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    Study(StudyDefinition),
    Locked(LockedStudy),
    DesignSaved { study_uid: String },
    SnapshotUpdated(SoASnapshotRow),
}

/// Apply an engine command on behalf of `req`
///
/// # Errors
/// Whatever the dispatched operation returns.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::CreateStudy { fields } => {
            create_study(conn, fields, ctx, req).map(EngineCommandResult::Study)
        }
        EngineCommand::EditStudy { study_uid, patch } => {
            edit_study(conn, &study_uid, patch, ctx, req).map(EngineCommandResult::Study)
        }
        EngineCommand::ReleaseStudy { study_uid } => {
            release_study(conn, &study_uid, ctx, req).map(EngineCommandResult::Study)
        }
        EngineCommand::LockStudy {
            study_uid,
            description,
        } => lock_study(conn, &study_uid, &description, req).map(EngineCommandResult::Locked),
        EngineCommand::UnlockStudy { study_uid } => {
            unlock_study(conn, &study_uid, ctx, req).map(EngineCommandResult::Study)
        }
        EngineCommand::DeleteStudy { study_uid } => {
            delete_study(conn, &study_uid, ctx, req).map(EngineCommandResult::Study)
        }
        EngineCommand::SaveStudyDesign { design } => {
            save_study_design(conn, &design, req)?;
            Ok(EngineCommandResult::DesignSaved {
                study_uid: design.study_uid,
            })
        }
        EngineCommand::UpdateSoASnapshot {
            study_uid,
            version,
            layout,
        } => update_soa_snapshot(conn, &study_uid, version, layout, req)
            .map(EngineCommandResult::SnapshotUpdated),
    }
}
