//! Persistence of flowchart selections
//!
//! One live document per study (`version_key = 'draft'`) plus one frozen
//! copy per locked version. Frozen copies are written once, at lock time.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, from_rusqlite_insert, serialization_error, Result};
use rusqlite::{Connection, OptionalExtension, Transaction};
use studymdr_core::errors::{ExError, ExErrorKind};
use studymdr_core::flowchart::StudyDesign;

const DRAFT_KEY: &str = "draft";

pub struct SqliteDesignRepo;

impl SqliteDesignRepo {
    /// Replace the live design of a study
    ///
    /// # Errors
    /// `Persistence` if the study does not exist or SQLite fails.
    pub fn save_draft_design(conn: &Connection, design: &StudyDesign) -> Result<()> {
        let json = serde_json::to_string(design)
            .map_err(|e| serialization_error("save_draft_design", e))?;

        conn.execute(
            "INSERT INTO study_designs (study_uid, version_key, design_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(study_uid, version_key) DO UPDATE SET
                design_json = excluded.design_json,
                updated_at = excluded.updated_at",
            rusqlite::params![
                design.study_uid,
                DRAFT_KEY,
                json,
                chrono::Utc::now().timestamp()
            ],
        )
        .map_err(|e| {
            from_rusqlite(e)
                .with_op("save_draft_design")
                .with_entity_id(design.study_uid.clone())
        })?;

        tracing::debug!(study_uid = %design.study_uid, "Saved draft design");
        Ok(())
    }

    /// Live design; an empty design when none was saved yet
    pub fn load_draft_design(conn: &Connection, study_uid: &str) -> Result<StudyDesign> {
        Ok(Self::load_row(conn, study_uid, DRAFT_KEY)?
            .unwrap_or_else(|| StudyDesign::new(study_uid)))
    }

    /// Design as seen by `version`: the frozen copy, or the live one for `None`
    ///
    /// # Errors
    /// `NotFound` when `version` has no frozen design.
    pub fn load_design(
        conn: &Connection,
        study_uid: &str,
        version: Option<u32>,
    ) -> Result<StudyDesign> {
        let Some(version) = version else {
            return Self::load_draft_design(conn, study_uid);
        };
        Self::load_row(conn, study_uid, &version.to_string())?.ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("load_design")
                .with_entity_id(study_uid)
                .with_version(version)
                .with_message("no frozen design for this study version")
        })
    }

    /// Copy the live design under `version`
    ///
    /// # Errors
    /// `Concurrency` if that version was already frozen.
    pub fn freeze_design(tx: &Transaction, study_uid: &str, version: u32) -> Result<StudyDesign> {
        let design = Self::load_draft_design(tx, study_uid)?;
        let json = serde_json::to_string(&design)
            .map_err(|e| serialization_error("freeze_design", e))?;

        tx.execute(
            "INSERT INTO study_designs (study_uid, version_key, design_json, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                study_uid,
                version.to_string(),
                json,
                chrono::Utc::now().timestamp()
            ],
        )
        .map_err(|e| from_rusqlite_insert("freeze_design", study_uid, e))?;

        tracing::debug!(study_uid, study_version = version, "Froze study design");
        Ok(design)
    }

    fn load_row(conn: &Connection, study_uid: &str, key: &str) -> Result<Option<StudyDesign>> {
        let json: Option<String> = conn
            .query_row(
                "SELECT design_json FROM study_designs WHERE study_uid = ?1 AND version_key = ?2",
                [study_uid, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(from_rusqlite)?;

        json.map(|j| serde_json::from_str(&j).map_err(|e| serialization_error("load_design", e)))
            .transpose()
    }
}
