#![allow(clippy::unwrap_used, clippy::expect_used)]

use studymdr_core::errors::StudyError;
use studymdr_core::logging_facility::test_capture::init_test_capture;
use studymdr_core::logging_facility::Profile;
use studymdr_core::{log_op_end, log_op_error, log_op_start};
use studymdr_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_carries_fields() {
    let capture = init_test_capture();
    let op_name = "lock_study_logging_1";

    log_op_start!(op_name, study_uid = "Study_000101", layout = "protocol");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    let start = &events[0];
    assert_eq!(start.event.as_deref(), Some(EVENT_START));
    assert_eq!(start.field("study_uid"), Some("Study_000101"));
    assert_eq!(start.field("layout"), Some("protocol"));
    assert!(start.component.is_some());
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "release_study_logging_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_records_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "delete_study_logging_3";

    let err = StudyError::DeleteWithLockedVersions {
        study_uid: "Study_000103".to_string(),
        locked_count: 2,
    };
    log_op_error!(op_name, &err, duration_ms = 5);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
    let event = capture
        .events_for_op(op_name)
        .into_iter()
        .find(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .unwrap();
    assert_eq!(event.field("err.code"), Some("ERR_ILLEGAL_STATE"));
    assert_eq!(event.field("err.kind"), Some("IllegalState"));
    assert!(event
        .field("message")
        .unwrap()
        .contains("having locked versions"));

    // The error is still usable by the caller
    assert!(matches!(err, StudyError::DeleteWithLockedVersions { .. }));
}

#[test]
fn test_one_start_one_end_per_operation() {
    let capture = init_test_capture();
    let op_name = "edit_study_logging_4";

    log_op_start!(op_name, study_uid = "Study_000104");
    log_op_end!(op_name, duration_ms = 1, study_uid = "Study_000104");

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    let ends = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END)
    });
    assert_eq!((starts, ends), (1, 1));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_assert_event_exists_panics_when_missing() {
    let capture = init_test_capture();
    capture.assert_event_exists("never_logged_logging_5", EVENT_START);
}

#[test]
fn test_profile_parsing_and_directives() {
    assert_eq!("development".parse::<Profile>().unwrap(), Profile::Development);
    assert_eq!("production".parse::<Profile>().unwrap(), Profile::Production);
    assert_eq!("test".parse::<Profile>().unwrap(), Profile::Test);
    assert!("verbose".parse::<Profile>().is_err());

    assert_eq!(Profile::Development.default_directive(), "studymdr=debug");
    assert_eq!(Profile::Production.default_directive(), "studymdr=info");
    assert_eq!(Profile::Test.default_directive(), "off");
}

#[test]
fn test_init_keeps_existing_subscriber() {
    let capture = init_test_capture();
    studymdr_core::logging_facility::init(Profile::Production);
    let op_name = "unlock_study_logging_6";

    log_op_start!(op_name, study_uid = "Study_000106");

    capture.assert_event_exists(op_name, EVENT_START);
}
