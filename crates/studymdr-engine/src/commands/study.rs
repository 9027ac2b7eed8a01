//! Study lifecycle orchestration.
//!
//! Every function loads the aggregate, applies one operation and saves it
//! inside a single `IMMEDIATE` transaction, so the locked-version count the
//! aggregate saw cannot move before the save.
//!
//! Locking additionally:
//! 1. freezes the live study design under the new version number
//! 2. builds and stores the SoA snapshot of each layout from that frozen design
//! 3. points the layout heads at the new version
//!
//! all before the commit. Unlocking disconnects the heads.

#![allow(clippy::result_large_err)]

use rusqlite::{Connection, Transaction, TransactionBehavior};
use studymdr_core::apply::apply;
use studymdr_core::commands::StudyCommand;
use studymdr_core::errors::{ExError, ExErrorKind, StudyError};
use studymdr_core::flowchart::{SoALayout, StudyDesign};
use studymdr_core::model::{StudyFields, StudyMetadataPatch};
use studymdr_core::rules::ValidationContext;
use studymdr_core::StudyDefinition;
use studymdr_core_types::RequestContext;
use studymdr_store::errors::from_rusqlite;
use studymdr_store::repo::load_term_labels;
use studymdr_store::snapshot::{disconnect_heads, set_head, SoASnapshotRow};
use studymdr_store::{Result, SqliteDesignRepo, SqliteStudyRepo};

use super::flowchart::store_snapshot;
use super::logged;

/// A freshly locked study and the snapshots written with it
#[derive(Debug, Clone)]
pub struct LockedStudy {
    pub study: StudyDefinition,
    pub version: u32,
    /// One row per layout, in `SoALayout::ALL` order
    pub snapshots: Vec<SoASnapshotRow>,
}

pub(crate) fn begin_immediate(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)
}

fn domain_error(op: &str, study_uid: &str, err: StudyError) -> ExError {
    let err = ExError::from(err).with_op(op);
    if err.entity_id().is_some() {
        err
    } else {
        err.with_entity_id(study_uid)
    }
}

/// Load a study or fail with `NotFound`
pub(crate) fn require_study(conn: &Connection, op: &str, study_uid: &str) -> Result<StudyDefinition> {
    SqliteStudyRepo::find_by_uid(conn, study_uid)?.ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op(op)
            .with_entity_id(study_uid)
            .with_message("study not found")
    })
}

/// Create a DRAFT study with the next `Study_NNNNNN` uid
///
/// # Errors
/// `Validation` from `ctx`; nothing is written then.
pub fn create_study(
    conn: &mut Connection,
    fields: StudyFields,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<StudyDefinition> {
    logged("create_study", "", req, || {
        let tx = begin_immediate(conn)?;
        let uid_gen = SqliteStudyRepo::uid_generator(&tx)?;
        let mut study = StudyDefinition::create(fields, ctx, &uid_gen)
            .map_err(|e| ExError::from(e).with_op("create_study"))?;
        SqliteStudyRepo::save(&tx, &mut study)?;
        tx.commit().map_err(from_rusqlite)?;

        tracing::info!(study_uid = study.uid(), "Created study");
        Ok(study)
    })
}

/// Load a study by uid
///
/// # Errors
/// `NotFound` if no such study exists.
pub fn get_study(conn: &Connection, study_uid: &str) -> Result<StudyDefinition> {
    require_study(conn, "get_study", study_uid)
}

/// Apply a lifecycle command other than `Lock` and save the result
///
/// `Lock` goes through `lock_study` because it also writes snapshots.
fn run_command(
    conn: &mut Connection,
    study_uid: &str,
    cmd: StudyCommand,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<StudyDefinition> {
    let op = cmd.op_name();
    let unlocking = matches!(cmd, StudyCommand::Unlock);

    logged(op, study_uid, req, || {
        let tx = begin_immediate(conn)?;
        let study = require_study(&tx, op, study_uid)?;
        let mut study = apply(study, cmd, ctx).map_err(|e| domain_error(op, study_uid, e))?;
        SqliteStudyRepo::save(&tx, &mut study)?;
        if unlocking {
            disconnect_heads(&tx, study_uid)?;
        }
        tx.commit().map_err(from_rusqlite)?;
        Ok(study)
    })
}

/// Merge `patch` into the draft
///
/// # Errors
/// `IllegalState` outside DRAFT, `InvalidArgument` for an empty patch,
/// `BusinessRule` when the study number would change, `Validation` from
/// `ctx`.
pub fn edit_study(
    conn: &mut Connection,
    study_uid: &str,
    patch: StudyMetadataPatch,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<StudyDefinition> {
    run_command(conn, study_uid, StudyCommand::Edit { patch }, ctx, req)
}

/// Publish the draft as the released copy, authored by the request's user
///
/// # Errors
/// `IllegalState` outside DRAFT.
pub fn release_study(
    conn: &mut Connection,
    study_uid: &str,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<StudyDefinition> {
    let author = req.author_or_unknown().to_string();
    run_command(conn, study_uid, StudyCommand::Release { author }, ctx, req)
}

/// Freeze the draft as the next locked version and snapshot its SoA
///
/// # Errors
/// - `IllegalState` outside DRAFT or without a study id
/// - `NotFound` when the design references unknown items; nothing is
///   locked then
/// - `Concurrency` when another writer locked the study first
pub fn lock_study(
    conn: &mut Connection,
    study_uid: &str,
    description: &str,
    req: &RequestContext,
) -> Result<LockedStudy> {
    logged("lock_study", study_uid, req, || {
        let tx = begin_immediate(conn)?;
        let mut study = require_study(&tx, "lock_study", study_uid)?;
        let version = study
            .lock(description, req.author_or_unknown())
            .map_err(|e| domain_error("lock_study", study_uid, e))?;
        SqliteStudyRepo::save(&tx, &mut study)?;

        let design = SqliteDesignRepo::freeze_design(&tx, study_uid, version)?;
        let snapshots = snapshot_all_layouts(&tx, study_uid, version, &design)?;

        tx.commit().map_err(from_rusqlite)?;
        tracing::info!(
            study_uid,
            study_version = version,
            layouts = snapshots.len(),
            "Locked study"
        );
        Ok(LockedStudy {
            study,
            version,
            snapshots,
        })
    })
}

fn snapshot_all_layouts(
    tx: &Transaction,
    study_uid: &str,
    version: u32,
    design: &StudyDesign,
) -> Result<Vec<SoASnapshotRow>> {
    let labels = load_term_labels(tx)?;
    SoALayout::ALL
        .into_iter()
        .map(|layout| {
            let row = store_snapshot(tx, study_uid, version, layout, design, &labels)?;
            set_head(tx, study_uid, layout, version)?;
            Ok(row)
        })
        .collect()
}

/// Open a new draft from the latest locked version
///
/// Version-less SoA loads return empty results until the next lock.
///
/// # Errors
/// `IllegalState` unless the study is LOCKED.
pub fn unlock_study(
    conn: &mut Connection,
    study_uid: &str,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<StudyDefinition> {
    run_command(conn, study_uid, StudyCommand::Unlock, ctx, req)
}

/// Soft-delete a study that was never locked
///
/// # Errors
/// `IllegalState` once a locked version exists or when already deleted.
pub fn delete_study(
    conn: &mut Connection,
    study_uid: &str,
    ctx: &dyn ValidationContext,
    req: &RequestContext,
) -> Result<StudyDefinition> {
    run_command(conn, study_uid, StudyCommand::Delete, ctx, req)
}
