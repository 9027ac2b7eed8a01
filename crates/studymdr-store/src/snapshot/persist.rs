//! Writing frozen SoA references
//!
//! A snapshot is keyed by `(study_uid, study_version, layout)`. Saving
//! replaces every reference of that key; callers run it inside the lock
//! transaction so the replacement is all-or-nothing.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, serialization_error, Result};
use crate::repo::SqliteStudyRepo;
use crate::snapshot::query::{fetch_snapshot_row, SoASnapshotRow};
use rusqlite::{Connection, Transaction};
use studymdr_core::errors::{ExError, ExErrorKind};
use studymdr_core::flowchart::SoALayout;
use studymdr_core::snapshot::{compute_snapshot_digest, SoASnapshot};

/// Replace the snapshot of one locked version and layout
///
/// # Errors
/// - `IllegalState` if `version` is not a locked version of the study
/// - `Persistence` on SQLite failures; nothing is written then
pub fn save_soa_snapshot(
    tx: &Transaction,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
    snapshot: &SoASnapshot,
) -> Result<SoASnapshotRow> {
    if !SqliteStudyRepo::locked_version_exists(tx, study_uid, version)? {
        return Err(ExError::new(ExErrorKind::IllegalState)
            .with_op("save_soa_snapshot")
            .with_entity_id(study_uid)
            .with_version(version)
            .with_message("SoA snapshots can only be saved for locked study versions"));
    }

    let digest = compute_snapshot_digest(snapshot)
        .map_err(|e| ExError::from(e).with_op("save_soa_snapshot"))?;

    delete_references(tx, study_uid, version, layout)?;

    tx.execute(
        "INSERT INTO soa_snapshots
            (study_uid, study_version, layout, digest, cell_ref_count, footnote_ref_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(study_uid, study_version, layout) DO UPDATE SET
            digest = excluded.digest,
            cell_ref_count = excluded.cell_ref_count,
            footnote_ref_count = excluded.footnote_ref_count,
            created_at = excluded.created_at",
        rusqlite::params![
            study_uid,
            version,
            layout.as_str(),
            digest,
            snapshot.cell_references.len() as i64,
            snapshot.footnote_references.len() as i64,
            chrono::Utc::now().timestamp_millis(),
        ],
    )
    .map_err(from_rusqlite)?;

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO soa_cell_references
                    (study_uid, study_version, layout, position, row_index, column_index,
                     item_uid, item_type, item_name, footnote_uids, row_hidden)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )
            .map_err(from_rusqlite)?;
        for (position, cell) in snapshot.cell_references.iter().enumerate() {
            let footnote_uids = serde_json::to_string(&cell.footnote_references)
                .map_err(|e| serialization_error("save_soa_snapshot", e))?;
            stmt.execute(rusqlite::params![
                study_uid,
                version,
                layout.as_str(),
                position as i64,
                cell.row_index as i64,
                cell.column_index as i64,
                cell.referenced_item.item_uid,
                cell.referenced_item.item_type.as_str(),
                cell.referenced_item.item_name,
                footnote_uids,
                cell.row_hidden,
            ])
            .map_err(from_rusqlite)?;
        }
    }

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO soa_footnote_references
                    (study_uid, study_version, layout, position, footnote_uid, order_symbol,
                     footnote_text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(from_rusqlite)?;
        for (position, footnote) in snapshot.footnote_references.iter().enumerate() {
            stmt.execute(rusqlite::params![
                study_uid,
                version,
                layout.as_str(),
                position as i64,
                footnote.footnote_uid,
                footnote.order_symbol,
                footnote.footnote_text,
            ])
            .map_err(from_rusqlite)?;
        }
    }

    tracing::debug!(
        study_uid,
        study_version = version,
        soa_layout = layout.as_str(),
        cell_ref_count = snapshot.cell_references.len(),
        footnote_ref_count = snapshot.footnote_references.len(),
        digest = %digest,
        "Saved SoA snapshot"
    );

    fetch_snapshot_row(tx, study_uid, version, layout)
}

/// Point the `(study, layout)` head at `version`
///
/// # Errors
/// `Persistence` if no snapshot exists for that key.
pub fn set_head(conn: &Connection, study_uid: &str, layout: SoALayout, version: u32) -> Result<()> {
    conn.execute(
        "INSERT INTO soa_snapshot_heads (study_uid, layout, study_version) VALUES (?1, ?2, ?3)
         ON CONFLICT(study_uid, layout) DO UPDATE SET study_version = excluded.study_version",
        rusqlite::params![study_uid, layout.as_str(), version],
    )
    .map_err(|e| from_rusqlite(e).with_op("set_head").with_entity_id(study_uid))?;
    Ok(())
}

/// Remove every head of a study; returns how many were removed
///
/// Called on unlock so version-less loads stop returning the last locked
/// snapshot while a draft is open.
pub fn disconnect_heads(conn: &Connection, study_uid: &str) -> Result<usize> {
    let removed = conn
        .execute(
            "DELETE FROM soa_snapshot_heads WHERE study_uid = ?1",
            [study_uid],
        )
        .map_err(from_rusqlite)?;
    if removed > 0 {
        tracing::debug!(study_uid, removed, "Disconnected SoA snapshot heads");
    }
    Ok(removed)
}

/// Drop one snapshot entirely; returns whether it existed
///
/// Resync tooling uses this before rebuilding a snapshot from scratch.
pub fn disconnect_soa_snapshot(
    tx: &Transaction,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<bool> {
    tx.execute(
        "DELETE FROM soa_snapshot_heads
         WHERE study_uid = ?1 AND layout = ?2 AND study_version = ?3",
        rusqlite::params![study_uid, layout.as_str(), version],
    )
    .map_err(from_rusqlite)?;
    delete_references(tx, study_uid, version, layout)?;
    let removed = tx
        .execute(
            "DELETE FROM soa_snapshots
             WHERE study_uid = ?1 AND study_version = ?2 AND layout = ?3",
            rusqlite::params![study_uid, version, layout.as_str()],
        )
        .map_err(from_rusqlite)?;
    Ok(removed > 0)
}

fn delete_references(
    conn: &Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<()> {
    for table in ["soa_cell_references", "soa_footnote_references"] {
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE study_uid = ?1 AND study_version = ?2 AND layout = ?3",
                table
            ),
            rusqlite::params![study_uid, version, layout.as_str()],
        )
        .map_err(from_rusqlite)?;
    }
    Ok(())
}
