#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::new_study;
use studymdr_core::errors::{ExError, ExErrorKind, StudyError};
use studymdr_core::model::{StudyDefinition, StudyDefinitionSnapshot, StudyStatus};

fn locked_twice() -> StudyDefinitionSnapshot {
    let mut study = new_study();
    study.lock("v1", "alice").unwrap();
    study.unlock().unwrap();
    study.lock("v2", "bob").unwrap();
    study.to_snapshot()
}

fn expect_inconsistent(snapshot: StudyDefinitionSnapshot, fragment: &str) {
    match StudyDefinition::from_snapshot(snapshot) {
        Err(err @ StudyError::InconsistentSnapshot { .. }) => {
            assert!(
                err.to_string().contains(fragment),
                "'{}' does not mention '{}'",
                err,
                fragment
            );
            assert_eq!(ExError::from(err).kind(), ExErrorKind::InvalidSnapshot);
        }
        other => panic!("expected InconsistentSnapshot, got {:?}", other),
    }
}

#[test]
fn test_locked_snapshot_restores_versions() {
    let snapshot = locked_twice();
    assert_eq!(snapshot.study_status, StudyStatus::Locked);
    assert_eq!(snapshot.locked_metadata_versions.len(), 2);

    let study = StudyDefinition::from_snapshot(snapshot.clone()).unwrap();
    assert_eq!(study.current_status().unwrap(), StudyStatus::Locked);
    assert_eq!(
        study.get_specific_locked_version(1).unwrap().version.version_description.as_deref(),
        Some("v1")
    );
    assert_eq!(study.to_snapshot(), snapshot);
}

#[test]
fn test_snapshot_json_uses_flat_field_names() {
    let json = new_study().to_snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let current = &value["current"];
    assert_eq!(current["study_number"], "0001");
    assert_eq!(current["project_number"], "123");
    assert!(current.get("ct_gov_id_null_value_code").is_some());
    assert_eq!(value["study_status"], "DRAFT");
}

#[test]
fn test_gap_in_locked_numbering_rejected() {
    let mut snapshot = locked_twice();
    snapshot.locked_metadata_versions[1].locked_version_number = Some(3);
    expect_inconsistent(snapshot, "expected 2");
}

#[test]
fn test_locked_status_with_draft_metadata_rejected() {
    let mut snapshot = new_study().to_snapshot();
    snapshot.study_status = StudyStatus::Locked;
    expect_inconsistent(snapshot, "Study_000001");
}

#[test]
fn test_deleted_snapshot_with_current_rejected() {
    let mut snapshot = new_study().to_snapshot();
    snapshot.deleted = true;
    expect_inconsistent(snapshot, "deleted study still carries current metadata");
}

#[test]
fn test_deleted_study_round_trips() {
    let mut study = new_study();
    study.mark_deleted().unwrap();
    let snapshot = study.to_snapshot();
    assert!(snapshot.current.is_none());

    let restored = StudyDefinition::from_snapshot(snapshot).unwrap();
    assert!(restored.is_deleted());
    assert_eq!(restored.uid(), "Study_000001");
}

#[test]
fn test_garbage_json_is_serialization_error() {
    let err = StudyDefinitionSnapshot::from_json("{not json").unwrap_err();
    assert_eq!(ExError::from(err).kind(), ExErrorKind::Serialization);
}
