#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{ctx, fields, new_study, req, setup_engine_db};
use studymdr_core::errors::ExErrorKind;
use studymdr_core::flowchart::SoALayout;
use studymdr_core::model::{
    NullableValue, StudyIdentificationMetadata, StudyMetadataPatch, StudyStatus,
};
use studymdr_core::rules::{CodelistValidationContext, TermCategory};
use studymdr_core_types::{RequestContext, TraceId};
use studymdr_engine::commands::study::{
    create_study, delete_study, edit_study, get_study, lock_study, release_study, unlock_study,
};
use studymdr_store::snapshot::head_version;
use studymdr_store::SqliteStudyRepo;

#[test]
fn test_create_assigns_sequential_uids() {
    let (_dir, mut conn) = setup_engine_db();

    let first = new_study(&mut conn);
    let second = create_study(&mut conn, fields("0002"), &ctx(), &req()).unwrap();

    assert_eq!(first.uid(), "Study_000001");
    assert_eq!(second.uid(), "Study_000002");
    assert_eq!(second.current_status().unwrap(), StudyStatus::Draft);
    assert_eq!(
        SqliteStudyRepo::list_study_uids(&conn).unwrap(),
        vec!["Study_000001", "Study_000002"]
    );
}

#[test]
fn test_rejected_create_writes_nothing() {
    let (_dir, mut conn) = setup_engine_db();
    let mut study_fields = fields("0001");
    study_fields.high_level_study_design.trial_phase_code = NullableValue::of("C99999".to_string());
    let strict = CodelistValidationContext::new()
        .with_project("123", None)
        .with_terms(TermCategory::TrialPhase, ["C15600"]);

    let err = create_study(&mut conn, study_fields, &strict, &req()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert_eq!(err.field(), Some("trial_phase_code"));
    assert!(SqliteStudyRepo::list_study_uids(&conn).unwrap().is_empty());
}

#[test]
fn test_lock_unlock_lock_numbers_versions() {
    let (_dir, mut conn) = setup_engine_db();
    let uid = new_study(&mut conn).uid().to_string();

    let v1 = lock_study(&mut conn, &uid, "first", &req()).unwrap();
    assert_eq!(v1.version, 1);
    assert_eq!(v1.study.current_status().unwrap(), StudyStatus::Locked);

    let unlocked = unlock_study(&mut conn, &uid, &ctx(), &req()).unwrap();
    assert_eq!(unlocked.current_status().unwrap(), StudyStatus::Draft);

    let v2 = lock_study(&mut conn, &uid, "second", &req()).unwrap();
    assert_eq!(v2.version, 2);

    let stored = get_study(&conn, &uid).unwrap();
    let versions: Vec<_> = stored
        .locked_versions()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m.version.locked_version_number,
                m.version.version_description.clone(),
                m.version.version_author.clone(),
            )
        })
        .collect();
    assert_eq!(
        versions,
        vec![
            (Some(1), Some("first".to_string()), Some("alice".to_string())),
            (Some(2), Some("second".to_string()), Some("alice".to_string())),
        ]
    );
}

#[test]
fn test_release_records_request_author() {
    let (_dir, mut conn) = setup_engine_db();
    let uid = new_study(&mut conn).uid().to_string();

    let study = release_study(&mut conn, &uid, &ctx(), &RequestContext::for_author("bob")).unwrap();
    let released = study.released_metadata().unwrap().unwrap();
    assert_eq!(released.version.study_status, StudyStatus::Released);
    assert_eq!(released.version.version_author.as_deref(), Some("bob"));

    let anonymous = release_study(&mut conn, &uid, &ctx(), &RequestContext::new()).unwrap();
    let released = anonymous.released_metadata().unwrap().unwrap();
    assert_eq!(released.version.version_author.as_deref(), Some("unknown-user"));
}

#[test]
fn test_edit_refused_while_locked_carries_request_ids() {
    let (_dir, mut conn) = setup_engine_db();
    let uid = new_study(&mut conn).uid().to_string();
    lock_study(&mut conn, &uid, "v1", &req()).unwrap();

    let request = RequestContext::for_author("alice").with_trace_id(TraceId::new());
    let patch = StudyMetadataPatch::default().with_identification(StudyIdentificationMetadata {
        study_acronym: Some("NEW".to_string()),
        ..Default::default()
    });
    let err = edit_study(&mut conn, &uid, patch, &ctx(), &request).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::IllegalState);
    assert!(err.message().contains("not in DRAFT state"));
    assert_eq!(err.op(), Some("edit_study"));
    assert_eq!(err.entity_id(), Some(uid.as_str()));
    assert_eq!(err.request_id(), Some(&request.request_id));
    assert_eq!(err.trace_id(), request.trace_id.as_ref());
}

#[test]
fn test_study_number_change_is_business_rule() {
    let (_dir, mut conn) = setup_engine_db();
    let uid = new_study(&mut conn).uid().to_string();

    let patch = StudyMetadataPatch::default().with_identification(StudyIdentificationMetadata {
        project_number: Some("123".to_string()),
        study_number: Some("0999".to_string()),
        ..Default::default()
    });
    let err = edit_study(&mut conn, &uid, patch, &ctx(), &req()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::BusinessRule);

    let stored = get_study(&conn, &uid).unwrap();
    assert_eq!(
        stored.current_metadata().unwrap().identification.study_number.as_deref(),
        Some("0001")
    );
}

#[test]
fn test_delete_only_before_first_lock() {
    let (_dir, mut conn) = setup_engine_db();
    let locked = new_study(&mut conn).uid().to_string();
    let draft = create_study(&mut conn, fields("0002"), &ctx(), &req())
        .unwrap()
        .uid()
        .to_string();
    lock_study(&mut conn, &locked, "v1", &req()).unwrap();
    unlock_study(&mut conn, &locked, &ctx(), &req()).unwrap();

    let err = delete_study(&mut conn, &locked, &ctx(), &req()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalState);
    assert!(!get_study(&conn, &locked).unwrap().is_deleted());

    let deleted = delete_study(&mut conn, &draft, &ctx(), &req()).unwrap();
    assert!(deleted.is_deleted());
    let err = lock_study(&mut conn, &draft, "v1", &req()).unwrap_err();
    assert!(err.message().contains("no operations allowed on deleted study"));
}

#[test]
fn test_unknown_study_not_found() {
    let (_dir, mut conn) = setup_engine_db();

    let err = get_study(&conn, "Study_000404").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);

    let err = lock_study(&mut conn, "Study_000404", "v1", &req()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.entity_id(), Some("Study_000404"));
}

#[test]
fn test_lock_without_study_number_rolls_back() {
    let (_dir, mut conn) = setup_engine_db();
    let mut study_fields = fields("0001");
    study_fields.identification.study_number = None;
    let uid = create_study(&mut conn, study_fields, &ctx(), &req())
        .unwrap()
        .uid()
        .to_string();

    let err = lock_study(&mut conn, &uid, "v1", &req()).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::IllegalState);
    assert_eq!(err.field(), Some("study_number"));

    let stored = get_study(&conn, &uid).unwrap();
    assert_eq!(stored.locked_version_count().unwrap(), 0);
    assert_eq!(head_version(&conn, &uid, SoALayout::Protocol).unwrap(), None);
}
