#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{new_study, permissive, study_fields};
use std::cell::Cell;
use studymdr_core::apply;
use studymdr_core::errors::{ExError, ExErrorKind, StudyError};
use studymdr_core::model::{
    HighLevelStudyDesign, NullableValue, StudyDefinition, StudyIdentificationMetadata,
    StudyMetadataPatch, StudyStatus,
};
use studymdr_core::rules::{CodelistValidationContext, TermCategory};
use studymdr_core::StudyCommand;

fn identification(project: &str, number: Option<&str>) -> StudyIdentificationMetadata {
    StudyIdentificationMetadata {
        project_number: Some(project.to_string()),
        study_number: number.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn test_lock_unlock_lock_numbers_versions() {
    let mut study = new_study();
    assert_eq!(study.current_status().unwrap(), StudyStatus::Draft);
    assert_eq!(study.locked_version_count().unwrap(), 0);

    assert_eq!(study.lock("v1 comment", "alice").unwrap(), 1);
    assert_eq!(study.current_status().unwrap(), StudyStatus::Locked);
    let v1 = study.current_metadata().unwrap();
    assert_eq!(v1.version.locked_version_number, Some(1));
    assert_eq!(v1.version.version_author.as_deref(), Some("alice"));
    assert_eq!(v1.version.version_description.as_deref(), Some("v1 comment"));

    study.unlock().unwrap();
    assert_eq!(study.current_status().unwrap(), StudyStatus::Draft);
    assert_eq!(study.locked_version_count().unwrap(), 1);

    assert_eq!(study.lock("v2 comment", "bob").unwrap(), 2);
    assert_eq!(study.locked_version_count().unwrap(), 2);
    assert_eq!(
        study
            .get_specific_locked_version(2)
            .unwrap()
            .version
            .version_author
            .as_deref(),
        Some("bob")
    );
}

#[test]
fn test_changing_study_number_is_business_rule_error() {
    let mut study = new_study();
    let patch = StudyMetadataPatch::default().with_identification(identification("123", Some("9999")));

    let err = study.edit(patch, &permissive()).unwrap_err();
    assert!(matches!(err, StudyError::StudyNumberImmutable { .. }));
    assert_eq!(ExError::from(err).kind(), ExErrorKind::BusinessRule);
    assert_eq!(
        study.current_metadata().unwrap().identification.study_number.as_deref(),
        Some("0001")
    );
}

#[test]
fn test_release_on_locked_study_is_illegal_state() {
    let mut study = new_study();
    study.lock("v1", "alice").unwrap();

    let err = study.release("alice").unwrap_err();
    assert!(err.to_string().contains("not in DRAFT state"));
    assert_eq!(ExError::from(err).kind(), ExErrorKind::IllegalState);
}

#[test]
fn test_edit_on_locked_study_is_illegal_state() {
    let mut study = new_study();
    study.lock("v1", "alice").unwrap();

    let patch = StudyMetadataPatch::default().with_identification(identification("123", None));
    let err = study.edit(patch, &permissive()).unwrap_err();
    assert!(err.to_string().contains("not in DRAFT state: edit not allowed"));
}

#[test]
fn test_empty_patch_rejected() {
    let mut study = new_study();
    let err = study
        .edit(StudyMetadataPatch::default(), &permissive())
        .unwrap_err();
    assert_eq!(err.to_string(), "no data to patch");
    assert_eq!(ExError::from(err).kind(), ExErrorKind::InvalidArgument);
}

#[test]
fn test_prefix_follows_project_until_first_lock() {
    let ctx = permissive().with_prefix("123", "P123").with_prefix("456", "P456");
    let mut study =
        StudyDefinition::create(study_fields("123", "0001"), &ctx, &|| "Study_000002".to_string())
            .unwrap();
    assert_eq!(study.study_id().unwrap().as_deref(), Some("P123-0001"));

    let move_project = || StudyMetadataPatch::default().with_identification(identification("456", None));
    study.edit(move_project(), &ctx).unwrap();
    assert_eq!(study.study_id().unwrap().as_deref(), Some("P456-0001"));

    study.lock("v1", "alice").unwrap();
    study.unlock().unwrap();

    // Once locked, prefix and number are pinned
    let back = StudyMetadataPatch::default().with_identification(identification("123", None));
    study.edit(back, &ctx).unwrap();
    let ident = &study.current_metadata().unwrap().identification;
    assert_eq!(ident.project_number.as_deref(), Some("123"));
    assert_eq!(ident.study_id_prefix.as_deref(), Some("P456"));
}

#[test]
fn test_lock_requires_study_number() {
    let fields = studymdr_core::model::StudyFields {
        identification: identification("123", None),
        ..Default::default()
    };
    let mut study =
        StudyDefinition::create(fields, &permissive(), &|| "Study_000003".to_string()).unwrap();

    match study.lock("v1", "alice") {
        Err(StudyError::MissingStudyIdentifier { field, .. }) => assert_eq!(field, "study_number"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(study.current_status().unwrap(), StudyStatus::Draft);
}

#[test]
fn test_missing_study_number_can_be_set_once() {
    let fields = studymdr_core::model::StudyFields {
        identification: identification("123", None),
        ..Default::default()
    };
    let mut study =
        StudyDefinition::create(fields, &permissive(), &|| "Study_000004".to_string()).unwrap();

    let first = StudyMetadataPatch::default().with_identification(identification("123", Some("0042")));
    study.edit(first, &permissive()).unwrap();
    assert_eq!(
        study.current_metadata().unwrap().identification.study_number.as_deref(),
        Some("0042")
    );

    let second = StudyMetadataPatch::default().with_identification(identification("123", Some("0043")));
    let err = study.edit(second, &permissive()).unwrap_err();
    assert!(matches!(err, StudyError::StudyNumberImmutable { .. }));

    // Leaving the number out keeps the one already set
    let unchanged = StudyMetadataPatch::default().with_identification(identification("123", None));
    study.edit(unchanged, &permissive()).unwrap();
    assert_eq!(study.lock("v1", "alice").unwrap(), 1);
    assert_eq!(study.study_id().unwrap().as_deref(), Some("123-0042"));
}

#[test]
fn test_create_rejects_unknown_trial_phase() {
    let ctx = CodelistValidationContext::new()
        .with_project("123", Some("P123"))
        .with_terms(TermCategory::TrialPhase, ["C15600"]);
    let mut fields = study_fields("123", "0001");
    fields.high_level_study_design = HighLevelStudyDesign {
        trial_phase_code: NullableValue::of("C99999".to_string()),
        ..Default::default()
    };

    let calls = Cell::new(0);
    let uid_gen = || {
        calls.set(calls.get() + 1);
        "Study_000004".to_string()
    };
    let err = StudyDefinition::create(fields.clone(), &ctx, &uid_gen).unwrap_err();

    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::Validation);
    assert_eq!(ex.field(), Some("trial_phase_code"));
    assert_eq!(ex.value(), Some("C99999"));
    assert_eq!(calls.get(), 0);

    fields.high_level_study_design.trial_phase_code = NullableValue::of("C15600".to_string());
    StudyDefinition::create(fields, &ctx, &uid_gen).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_delete_never_locked_study() {
    let mut study = new_study();
    study.mark_deleted().unwrap();

    assert!(study.is_deleted());
    for err in [
        study.current_metadata().map(|_| ()).unwrap_err(),
        study.current_status().map(|_| ()).unwrap_err(),
        study.release("alice").unwrap_err(),
        study.unlock().unwrap_err(),
        study.mark_deleted().unwrap_err(),
    ] {
        assert!(err.to_string().contains("no operations allowed on deleted study"));
    }
    // Identity stays readable
    assert_eq!(study.uid(), "Study_000001");
}

#[test]
fn test_delete_after_lock_refused() {
    let mut study = new_study();
    study.lock("v1", "alice").unwrap();
    study.unlock().unwrap();

    let err = study.mark_deleted().unwrap_err();
    assert!(err
        .to_string()
        .contains("cannot delete a StudyDefinition having locked versions"));
    assert_eq!(ExError::from(err).kind(), ExErrorKind::IllegalState);
    assert!(!study.is_deleted());
}

#[test]
fn test_repeated_release_refreshes_timestamps() {
    let mut study = new_study();
    study.release("alice").unwrap();
    let first = study.released_metadata().unwrap().unwrap().clone();

    study.release("bob").unwrap();
    let second = study.released_metadata().unwrap().unwrap().clone();

    assert!(second.version.version_timestamp >= first.version.version_timestamp);
    assert_eq!(second.version.version_author.as_deref(), Some("bob"));
    assert_eq!(second.identification, first.identification);
}

#[test]
fn test_apply_error_leaves_callers_copy_valid() {
    let study = new_study();
    let backup = study.clone();

    let locked = apply(
        study,
        StudyCommand::Lock {
            description: "v1".to_string(),
            author: "alice".to_string(),
        },
        &permissive(),
    )
    .unwrap();

    let again = locked.clone();
    let err = apply(again, StudyCommand::Release { author: "alice".to_string() }, &permissive())
        .unwrap_err();
    assert!(matches!(err, StudyError::NotInDraftState { .. }));

    assert_eq!(locked.current_status().unwrap(), StudyStatus::Locked);
    assert_eq!(backup.current_status().unwrap(), StudyStatus::Draft);
}
