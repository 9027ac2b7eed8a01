//! SQLite repository for the study definition aggregate
//!
//! The aggregate is persisted through its memento: the mutable part lives
//! in `study_roots`, locked versions are appended to
//! `study_locked_versions` and never rewritten.

#![allow(clippy::result_large_err)]

use crate::errors::{
    concurrency_conflict, from_rusqlite, from_rusqlite_insert, serialization_error, Result,
};
use rusqlite::{Connection, OptionalExtension, Transaction};
use studymdr_core::errors::{ExError, ExErrorKind};
use studymdr_core::model::{
    RepositoryClosureData, StudyDefinition, StudyDefinitionSnapshot, StudyMetadataSnapshot,
    StudyStatus,
};
use studymdr_core::uid::StudyUidGenerator;

struct RootRow {
    deleted: bool,
    study_status: String,
    draft_json: Option<String>,
    released_json: Option<String>,
    locked_count: usize,
}

/// SQLite repository for study definitions
pub struct SqliteStudyRepo;

impl SqliteStudyRepo {
    /// Load a study by uid
    ///
    /// The returned aggregate carries `RepositoryClosureData` with the
    /// locked-version count seen here; `save` checks it.
    ///
    /// # Errors
    /// - `Persistence` on SQLite failures or a corrupt root row
    /// - `InvalidSnapshot` if the stored versions are inconsistent
    pub fn find_by_uid(conn: &Connection, uid: &str) -> Result<Option<StudyDefinition>> {
        let root = conn
            .query_row(
                "SELECT deleted, study_status, draft_json, released_json, locked_count
                 FROM study_roots WHERE uid = ?1",
                [uid],
                |row| {
                    Ok(RootRow {
                        deleted: row.get::<_, i64>(0)? != 0,
                        study_status: row.get(1)?,
                        draft_json: row.get(2)?,
                        released_json: row.get(3)?,
                        locked_count: row.get::<_, i64>(4)? as usize,
                    })
                },
            )
            .optional()
            .map_err(from_rusqlite)?;

        let Some(root) = root else {
            return Ok(None);
        };

        let locked = Self::load_locked_versions(conn, uid)?;
        if locked.len() != root.locked_count {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("find_study")
                .with_entity_id(uid)
                .with_message(format!(
                    "root row records {} locked versions, found {}",
                    root.locked_count,
                    locked.len()
                )));
        }

        let study_status = parse_status(uid, &root.study_status)?;
        let current = match study_status {
            StudyStatus::Locked => locked.last().cloned(),
            StudyStatus::Draft | StudyStatus::Released => {
                root.draft_json.as_deref().map(decode_metadata).transpose()?
            }
        };

        let snapshot = StudyDefinitionSnapshot {
            uid: uid.to_string(),
            deleted: root.deleted,
            current,
            released: root
                .released_json
                .as_deref()
                .map(decode_metadata)
                .transpose()?,
            locked_metadata_versions: locked,
            study_status,
        };

        let mut study = StudyDefinition::from_snapshot(snapshot)
            .map_err(|e| ExError::from(e).with_op("find_study"))?;
        study.set_repository_closure_data(RepositoryClosureData {
            persisted_locked_count: root.locked_count,
        });
        Ok(Some(study))
    }

    /// Persist the aggregate
    ///
    /// New locked versions are appended; existing ones are never touched.
    /// On success the aggregate's closure data is refreshed, so it can be
    /// saved again within the same unit of work.
    ///
    /// # Errors
    /// - `Concurrency` if the persisted locked count differs from the one
    ///   recorded at load time, or the study was created twice
    /// - `Persistence` on SQLite failures
    pub fn save(tx: &Transaction, study: &mut StudyDefinition) -> Result<()> {
        let uid = study.uid().to_string();

        let persisted: Option<usize> = tx
            .query_row(
                "SELECT locked_count FROM study_roots WHERE uid = ?1",
                [&uid],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(from_rusqlite)?
            .map(|n| n as usize);

        match (study.repository_closure_data(), persisted) {
            (None, None) => {}
            (Some(loaded), Some(current)) if loaded.persisted_locked_count == current => {}
            (Some(loaded), Some(current)) => {
                return Err(concurrency_conflict(
                    "save_study",
                    &uid,
                    &format!(
                        "locked versions changed since load: expected {}, found {}",
                        loaded.persisted_locked_count, current
                    ),
                ));
            }
            (Some(_), None) => {
                return Err(concurrency_conflict(
                    "save_study",
                    &uid,
                    "study row disappeared since load",
                ));
            }
            (None, Some(_)) => {
                return Err(concurrency_conflict("save_study", &uid, "study already exists"));
            }
        }

        let snapshot = study.to_snapshot();
        let already_locked = persisted.unwrap_or(0);

        let draft_json = match snapshot.study_status {
            StudyStatus::Draft | StudyStatus::Released => {
                snapshot.current.as_ref().map(encode_metadata).transpose()?
            }
            StudyStatus::Locked => None,
        };
        let released_json = snapshot.released.as_ref().map(encode_metadata).transpose()?;
        let (study_number, project_number) = snapshot
            .current
            .as_ref()
            .map(|c| (c.study_number.clone(), c.project_number.clone()))
            .unwrap_or_default();

        tx.execute(
            "INSERT INTO study_roots
                (uid, deleted, study_status, draft_json, released_json, locked_count,
                 study_number, project_number, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(uid) DO UPDATE SET
                deleted = excluded.deleted,
                study_status = excluded.study_status,
                draft_json = excluded.draft_json,
                released_json = excluded.released_json,
                locked_count = excluded.locked_count,
                study_number = excluded.study_number,
                project_number = excluded.project_number,
                updated_at = excluded.updated_at",
            rusqlite::params![
                uid,
                if snapshot.deleted { 1 } else { 0 },
                snapshot.study_status.as_str(),
                draft_json,
                released_json,
                snapshot.locked_metadata_versions.len() as i64,
                study_number,
                project_number,
                chrono::Utc::now().timestamp(),
            ],
        )
        .map_err(from_rusqlite)?;

        for (index, locked) in snapshot
            .locked_metadata_versions
            .iter()
            .enumerate()
            .skip(already_locked)
        {
            tx.execute(
                "INSERT INTO study_locked_versions
                    (study_uid, version_number, metadata_json, version_author,
                     version_description, locked_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    uid,
                    index as i64 + 1,
                    encode_metadata(locked)?,
                    locked.version_author,
                    locked.version_description,
                    locked.version_timestamp.to_rfc3339(),
                ],
            )
            .map_err(|e| from_rusqlite_insert("save_study", &uid, e))?;
        }

        let locked_count = snapshot.locked_metadata_versions.len();
        study.set_repository_closure_data(RepositoryClosureData {
            persisted_locked_count: locked_count,
        });

        tracing::debug!(
            study_uid = %uid,
            study_status = %snapshot.study_status,
            locked_count,
            "Saved study definition"
        );
        Ok(())
    }

    /// Whether a locked version exists
    pub fn locked_version_exists(conn: &Connection, uid: &str, version: u32) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM study_locked_versions WHERE study_uid = ?1 AND version_number = ?2",
                rusqlite::params![uid, version],
                |_| Ok(()),
            )
            .optional()
            .map_err(from_rusqlite)?;
        Ok(found.is_some())
    }

    /// Uids of all studies, deleted ones included, in uid order
    pub fn list_study_uids(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn
            .prepare("SELECT uid FROM study_roots ORDER BY uid")
            .map_err(from_rusqlite)?;
        let uids = stmt
            .query_map([], |row| row.get(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(from_rusqlite)?;
        Ok(uids)
    }

    /// Sequential uid generator continuing after the highest stored uid
    pub fn uid_generator(conn: &Connection) -> Result<StudyUidGenerator> {
        let last = Self::list_study_uids(conn)?
            .iter()
            .filter_map(|uid| StudyUidGenerator::parse(uid))
            .max()
            .unwrap_or(0);
        Ok(StudyUidGenerator::starting_after(last))
    }

    fn load_locked_versions(conn: &Connection, uid: &str) -> Result<Vec<StudyMetadataSnapshot>> {
        let mut stmt = conn
            .prepare(
                "SELECT metadata_json FROM study_locked_versions
                 WHERE study_uid = ?1 ORDER BY version_number",
            )
            .map_err(from_rusqlite)?;
        let rows = stmt
            .query_map([uid], |row| row.get::<_, String>(0))
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        rows.iter().map(|json| decode_metadata(json)).collect()
    }
}

fn parse_status(uid: &str, status: &str) -> Result<StudyStatus> {
    match status {
        "DRAFT" => Ok(StudyStatus::Draft),
        "LOCKED" => Ok(StudyStatus::Locked),
        other => Err(ExError::new(ExErrorKind::Persistence)
            .with_op("find_study")
            .with_entity_id(uid)
            .with_field("study_status")
            .with_value(other)
            .with_message("unexpected study status in root row")),
    }
}

fn encode_metadata(metadata: &StudyMetadataSnapshot) -> Result<String> {
    serde_json::to_string(metadata).map_err(|e| serialization_error("encode_study_metadata", e))
}

fn decode_metadata(json: &str) -> Result<StudyMetadataSnapshot> {
    serde_json::from_str(json).map_err(|e| serialization_error("decode_study_metadata", e))
}
