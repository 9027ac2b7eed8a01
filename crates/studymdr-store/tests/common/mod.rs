#![allow(dead_code)]

use rusqlite::Connection;
use studymdr_core::model::{StudyFields, StudyIdentificationMetadata};
use studymdr_core::rules::PermissiveValidationContext;
use studymdr_core::snapshot::{ReferencedItem, SoACellReference, SoAFootnoteReference, SoASnapshot};
use studymdr_core::flowchart::SoAItemType;
use studymdr_core::StudyDefinition;
use studymdr_store::db::open_store;
use studymdr_store::SqliteStudyRepo;
use tempfile::TempDir;

/// Migrated on-disk database in a scratch directory
pub fn setup_test_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let conn = open_store(temp_dir.path().join("studymdr.db")).unwrap();
    (temp_dir, conn)
}

pub fn draft_study(uid: &str) -> StudyDefinition {
    let fields = StudyFields {
        identification: StudyIdentificationMetadata {
            project_number: Some("123".to_string()),
            study_number: Some("0001".to_string()),
            study_acronym: Some("ACR".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let uid = uid.to_string();
    StudyDefinition::create(fields, &PermissiveValidationContext::new(), &move || uid.clone())
        .unwrap()
}

/// Persist a new draft study
pub fn insert_study(conn: &mut Connection, uid: &str) -> StudyDefinition {
    let mut study = draft_study(uid);
    let tx = conn.transaction().unwrap();
    SqliteStudyRepo::save(&tx, &mut study).unwrap();
    tx.commit().unwrap();
    study
}

/// Load, lock and save; returns the new version number
pub fn lock_study(conn: &mut Connection, uid: &str, description: &str) -> u32 {
    let tx = conn.transaction().unwrap();
    let mut study = SqliteStudyRepo::find_by_uid(&tx, uid).unwrap().unwrap();
    let version = study.lock(description, "alice").unwrap();
    SqliteStudyRepo::save(&tx, &mut study).unwrap();
    tx.commit().unwrap();
    version
}

pub fn unlock_study(conn: &mut Connection, uid: &str) {
    let tx = conn.transaction().unwrap();
    let mut study = SqliteStudyRepo::find_by_uid(&tx, uid).unwrap().unwrap();
    study.unlock().unwrap();
    SqliteStudyRepo::save(&tx, &mut study).unwrap();
    tx.commit().unwrap();
}

pub fn cell(row: usize, col: usize, item_type: SoAItemType, uid: &str, name: &str) -> SoACellReference {
    SoACellReference {
        row_index: row,
        column_index: col,
        referenced_item: ReferencedItem {
            item_uid: uid.to_string(),
            item_type,
            item_name: Some(name.to_string()),
        },
        footnote_references: Vec::new(),
        row_hidden: false,
    }
}

/// Two cells and one footnote referenced from the second cell
pub fn sample_snapshot(activity_name: &str) -> SoASnapshot {
    let mut weight = cell(7, 0, SoAItemType::StudyActivity, "A1", activity_name);
    weight.footnote_references.push("F1".to_string());
    SoASnapshot {
        cell_references: vec![
            cell(0, 1, SoAItemType::StudyEpoch, "E1", "Screening"),
            weight,
        ],
        footnote_references: vec![SoAFootnoteReference {
            footnote_uid: "F1".to_string(),
            order_symbol: "a".to_string(),
            footnote_text: "Fasting".to_string(),
        }],
    }
}
