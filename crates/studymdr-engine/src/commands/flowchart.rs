//! Flowchart queries and SoA snapshot maintenance.
//!
//! Tables for an explicit version are built from the design frozen at that
//! version's lock, so they never change afterwards. Version `None` means
//! the live draft design.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;

use rusqlite::{Connection, Transaction};
use studymdr_core::errors::{ExError, ExErrorKind};
use studymdr_core::flowchart::{
    build_flowchart_table, item_uid_coordinates, FlowchartOptions, SoALayout, SoaTable,
    StudyDesign, TermLabelLookup, TimeUnit,
};
use studymdr_core::model::StudyStatus;
use studymdr_core::snapshot::{rebuild_table, SoASnapshot};
use studymdr_core_types::RequestContext;
use studymdr_store::errors::from_rusqlite;
use studymdr_store::repo::load_term_labels;
use studymdr_store::snapshot::{head_version, save_soa_snapshot, set_head, SoASnapshotRow};
use studymdr_store::{Result, SqliteDesignRepo};

use super::logged;
use super::study::{begin_immediate, require_study};

fn build_table(
    op: &str,
    design: &StudyDesign,
    options: &FlowchartOptions,
    labels: &dyn TermLabelLookup,
) -> Result<SoaTable> {
    build_flowchart_table(design, options, labels).map_err(|e| ExError::from(e).with_op(op))
}

/// Build the table of `layout` from `design` and persist its references
///
/// Runs inside the caller's transaction; the head pointer is left alone.
pub(crate) fn store_snapshot(
    tx: &Transaction,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
    design: &StudyDesign,
    labels: &dyn TermLabelLookup,
) -> Result<SoASnapshotRow> {
    let table = build_table(
        "update_soa_snapshot",
        design,
        &FlowchartOptions::for_layout(layout),
        labels,
    )?;
    let snapshot = SoASnapshot::from_table(&table);
    let row = save_soa_snapshot(tx, study_uid, version, layout, &snapshot)?;

    tracing::debug!(
        study_uid,
        study_version = version,
        soa_layout = layout.as_str(),
        cell_ref_count = row.cell_ref_count,
        footnote_ref_count = row.footnote_ref_count,
        "Stored SoA snapshot"
    );
    Ok(row)
}

/// Render the flowchart of a study
///
/// # Errors
/// - `NotFound` for an unknown study, a version without frozen design, or
///   dangling references in the design
pub fn get_flowchart_table(
    conn: &Connection,
    study_uid: &str,
    version: Option<u32>,
    options: &FlowchartOptions,
) -> Result<SoaTable> {
    require_study(conn, "get_flowchart_table", study_uid)?;
    let design = SqliteDesignRepo::load_design(conn, study_uid, version)?;
    let labels = load_term_labels(conn)?;
    build_table("get_flowchart_table", &design, options, &labels)
}

/// References a snapshot of `version` would hold, without storing them
///
/// # Errors
/// `NotFound` when `version` was never locked.
pub fn build_soa_snapshot(
    conn: &Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<SoASnapshot> {
    let table = get_flowchart_table(
        conn,
        study_uid,
        Some(version),
        &FlowchartOptions::for_layout(layout),
    )?;
    Ok(SoASnapshot::from_table(&table))
}

/// Rebuild and replace the stored snapshot of one locked version
///
/// Backfill for versions locked before a layout existed or whose snapshot
/// was disconnected. Running it twice stores identical references. The
/// layout head moves to `version` only when it is the study's current
/// locked version.
///
/// # Errors
/// `NotFound` for an unknown study or a version that was never locked.
pub fn update_soa_snapshot(
    conn: &mut Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
    req: &RequestContext,
) -> Result<SoASnapshotRow> {
    logged("update_soa_snapshot", study_uid, req, || {
        let tx = begin_immediate(conn)?;
        let study = require_study(&tx, "update_soa_snapshot", study_uid)?;
        let design = SqliteDesignRepo::load_design(&tx, study_uid, Some(version))?;
        let labels = load_term_labels(&tx)?;
        let row = store_snapshot(&tx, study_uid, version, layout, &design, &labels)?;

        let current_lock = study
            .current_status()
            .map(|status| status == StudyStatus::Locked)
            .unwrap_or(false)
            && study.locked_version_count().ok() == Some(version as usize);
        if current_lock {
            set_head(&tx, study_uid, layout, version)?;
        }

        tx.commit().map_err(from_rusqlite)?;
        Ok(row)
    })
}

/// Render a stored snapshot
///
/// `version = None` follows the layout head. A study that is unlocked, or
/// a version never snapshotted, renders as an empty table.
///
/// # Errors
/// `NotFound` for an unknown study, or a version without frozen design.
pub fn load_soa_snapshot(
    conn: &Connection,
    study_uid: &str,
    version: Option<u32>,
    layout: SoALayout,
    time_unit: Option<TimeUnit>,
) -> Result<SoaTable> {
    require_study(conn, "load_soa_snapshot", study_uid)?;

    let version = match version {
        Some(v) => Some(v),
        None => head_version(conn, study_uid, layout)?,
    };
    let Some(version) = version else {
        let empty = SoASnapshot::default();
        return Ok(rebuild_table(&empty, &StudyDesign::new(study_uid), layout, time_unit));
    };

    let snapshot = studymdr_store::snapshot::load_soa_snapshot(conn, study_uid, Some(version), layout)?;
    let design = SqliteDesignRepo::load_design(conn, study_uid, Some(version))?;
    Ok(rebuild_table(&snapshot, &design, layout, time_unit))
}

/// Item uid -> (row, column) in the detailed table
///
/// # Errors
/// Same as `get_flowchart_table`.
pub fn get_flowchart_item_uid_coordinates(
    conn: &Connection,
    study_uid: &str,
    version: Option<u32>,
) -> Result<BTreeMap<String, (usize, usize)>> {
    let table = get_flowchart_table(
        conn,
        study_uid,
        version,
        &FlowchartOptions::for_layout(SoALayout::Detailed),
    )?;
    Ok(item_uid_coordinates(&table))
}

/// Replace the live design of a DRAFT study
///
/// # Errors
/// - `NotFound` for an unknown study or dangling references
/// - `IllegalState` unless the study is DRAFT
pub fn save_study_design(
    conn: &mut Connection,
    design: &StudyDesign,
    req: &RequestContext,
) -> Result<()> {
    let study_uid = design.study_uid.as_str();
    logged("save_study_design", study_uid, req, || {
        let tx = begin_immediate(conn)?;
        let study = require_study(&tx, "save_study_design", study_uid)?;
        let status = study
            .current_status()
            .map_err(|e| ExError::from(e).with_op("save_study_design"))?;
        if status != StudyStatus::Draft {
            return Err(ExError::new(ExErrorKind::IllegalState)
                .with_op("save_study_design")
                .with_entity_id(study_uid)
                .with_message("study design can only change while the study is in DRAFT state"));
        }
        design
            .check_references()
            .map_err(|e| ExError::from(e).with_op("save_study_design"))?;

        SqliteDesignRepo::save_draft_design(&tx, design)?;
        tx.commit().map_err(from_rusqlite)?;
        Ok(())
    })
}
