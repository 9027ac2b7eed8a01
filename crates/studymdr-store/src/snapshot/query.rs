//! Read-only SoA snapshot queries

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, serialization_error, Result};
use rusqlite::{Connection, OptionalExtension};
use studymdr_core::errors::{ExError, ExErrorKind};
use studymdr_core::flowchart::{SoAItemType, SoALayout};
use studymdr_core::snapshot::{
    ReferencedItem, SoACellReference, SoAFootnoteReference, SoASnapshot,
};

/// A row of the `soa_snapshots` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoASnapshotRow {
    pub study_uid: String,
    pub study_version: u32,
    pub layout: SoALayout,
    /// SHA-256 of the reference lists
    pub digest: String,
    pub cell_ref_count: usize,
    pub footnote_ref_count: usize,
    /// Milliseconds since epoch
    pub created_at: i64,
}

/// Load the frozen references of a snapshot
///
/// With `version = None` the study's head for `layout` is followed; while
/// the study is unlocked there is no head and the result is empty. A key
/// that was never saved also yields an empty snapshot; use
/// [`snapshot_exists`] to tell the two apart.
pub fn load_soa_snapshot(
    conn: &Connection,
    study_uid: &str,
    version: Option<u32>,
    layout: SoALayout,
) -> Result<SoASnapshot> {
    let version = match version {
        Some(v) => v,
        None => match head_version(conn, study_uid, layout)? {
            Some(v) => v,
            None => return Ok(SoASnapshot::default()),
        },
    };

    let cell_references = load_cell_references(conn, study_uid, version, layout)?;
    let footnote_references = load_footnote_references(conn, study_uid, version, layout)?;

    Ok(SoASnapshot {
        cell_references,
        footnote_references,
    })
}

/// Whether a snapshot was saved for the key, empty or not
pub fn snapshot_exists(
    conn: &Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM soa_snapshots
             WHERE study_uid = ?1 AND study_version = ?2 AND layout = ?3",
            rusqlite::params![study_uid, version, layout.as_str()],
            |_| Ok(()),
        )
        .optional()
        .map_err(from_rusqlite)?;
    Ok(found.is_some())
}

/// Version the `(study, layout)` head points at, if any
pub fn head_version(conn: &Connection, study_uid: &str, layout: SoALayout) -> Result<Option<u32>> {
    conn.query_row(
        "SELECT study_version FROM soa_snapshot_heads WHERE study_uid = ?1 AND layout = ?2",
        rusqlite::params![study_uid, layout.as_str()],
        |row| row.get(0),
    )
    .optional()
    .map_err(from_rusqlite)
}

/// Fetch the existence row of a snapshot
///
/// # Errors
/// - `NotFound` if the snapshot was never saved
/// - `Persistence` on SQLite failures
pub fn fetch_snapshot_row(
    conn: &Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<SoASnapshotRow> {
    conn.query_row(
        "SELECT study_uid, study_version, digest, cell_ref_count, footnote_ref_count, created_at
         FROM soa_snapshots WHERE study_uid = ?1 AND study_version = ?2 AND layout = ?3",
        rusqlite::params![study_uid, version, layout.as_str()],
        |row| {
            Ok(SoASnapshotRow {
                study_uid: row.get(0)?,
                study_version: row.get(1)?,
                layout,
                digest: row.get(2)?,
                cell_ref_count: row.get::<_, i64>(3)? as usize,
                footnote_ref_count: row.get::<_, i64>(4)? as usize,
                created_at: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(from_rusqlite)?
    .ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("fetch_snapshot_row")
            .with_entity_id(study_uid)
            .with_version(version)
            .with_message(format!("no {} SoA snapshot", layout))
    })
}

/// All snapshot rows of a study, by version then layout
pub fn list_snapshot_rows(conn: &Connection, study_uid: &str) -> Result<Vec<SoASnapshotRow>> {
    let mut stmt = conn
        .prepare(
            "SELECT study_version, layout FROM soa_snapshots
             WHERE study_uid = ?1 ORDER BY study_version, layout",
        )
        .map_err(from_rusqlite)?;
    let keys = stmt
        .query_map([study_uid], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    keys.into_iter()
        .map(|(version, layout)| {
            let layout = parse_layout(&layout)?;
            fetch_snapshot_row(conn, study_uid, version, layout)
        })
        .collect()
}

fn load_cell_references(
    conn: &Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<Vec<SoACellReference>> {
    let mut stmt = conn
        .prepare(
            "SELECT row_index, column_index, item_uid, item_type, item_name, footnote_uids,
                    row_hidden
             FROM soa_cell_references
             WHERE study_uid = ?1 AND study_version = ?2 AND layout = ?3
             ORDER BY position",
        )
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map(rusqlite::params![study_uid, version, layout.as_str()], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
            ))
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    rows.into_iter()
        .map(
            |(row_index, column_index, item_uid, item_type, item_name, footnote_uids, row_hidden)| {
                let item_type: SoAItemType = item_type
                    .parse()
                    .map_err(|e| ExError::from(e).with_op("load_soa_snapshot"))?;
                let footnote_references: Vec<String> = serde_json::from_str(&footnote_uids)
                    .map_err(|e| serialization_error("load_soa_snapshot", e))?;
                Ok(SoACellReference {
                    row_index: row_index as usize,
                    column_index: column_index as usize,
                    referenced_item: ReferencedItem {
                        item_uid,
                        item_type,
                        item_name,
                    },
                    footnote_references,
                    row_hidden,
                })
            },
        )
        .collect()
}

fn load_footnote_references(
    conn: &Connection,
    study_uid: &str,
    version: u32,
    layout: SoALayout,
) -> Result<Vec<SoAFootnoteReference>> {
    let mut stmt = conn
        .prepare(
            "SELECT footnote_uid, order_symbol, footnote_text
             FROM soa_footnote_references
             WHERE study_uid = ?1 AND study_version = ?2 AND layout = ?3
             ORDER BY position",
        )
        .map_err(from_rusqlite)?;

    let footnotes = stmt
        .query_map(rusqlite::params![study_uid, version, layout.as_str()], |row| {
            Ok(SoAFootnoteReference {
                footnote_uid: row.get(0)?,
                order_symbol: row.get(1)?,
                footnote_text: row.get(2)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(footnotes)
}

fn parse_layout(layout: &str) -> Result<SoALayout> {
    layout
        .parse()
        .map_err(|e| ExError::from(e).with_op("list_snapshot_rows"))
}
