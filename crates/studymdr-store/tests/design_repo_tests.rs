#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{insert_study, setup_test_db};
use studymdr_core::errors::ExErrorKind;
use studymdr_core::flowchart::design::{StudyEpoch, StudyVisit};
use studymdr_core::flowchart::{StudyDesign, TimeUnit};
use studymdr_store::SqliteDesignRepo;

fn design_with_visit(name: &str) -> StudyDesign {
    let mut design = StudyDesign::new("Study_000001");
    design.preferred_time_unit = TimeUnit::Week;
    design.add_epoch(StudyEpoch {
        uid: "E1".to_string(),
        term_uid: "CT_SCREENING".to_string(),
        order: 1,
    });
    design
        .add_visit(StudyVisit {
            uid: "V1".to_string(),
            epoch_uid: "E1".to_string(),
            order: 1,
            name: name.to_string(),
            study_day: Some(1),
            study_week: Some(1),
            window_min: None,
            window_max: None,
            show_visit: true,
        })
        .unwrap();
    design
}

#[test]
fn test_missing_draft_design_is_empty() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, "Study_000001");

    let design = SqliteDesignRepo::load_draft_design(&conn, "Study_000001").unwrap();
    assert_eq!(design, StudyDesign::new("Study_000001"));
}

#[test]
fn test_frozen_design_ignores_later_edits() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, "Study_000001");
    SqliteDesignRepo::save_draft_design(&conn, &design_with_visit("Screening visit")).unwrap();

    let tx = conn.transaction().unwrap();
    let frozen = SqliteDesignRepo::freeze_design(&tx, "Study_000001", 1).unwrap();
    tx.commit().unwrap();
    assert_eq!(frozen, design_with_visit("Screening visit"));

    SqliteDesignRepo::save_draft_design(&conn, &design_with_visit("Renamed visit")).unwrap();

    let v1 = SqliteDesignRepo::load_design(&conn, "Study_000001", Some(1)).unwrap();
    assert_eq!(v1.visits[0].name, "Screening visit");
    let draft = SqliteDesignRepo::load_design(&conn, "Study_000001", None).unwrap();
    assert_eq!(draft.visits[0].name, "Renamed visit");
}

#[test]
fn test_freezing_twice_conflicts() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, "Study_000001");

    let tx = conn.transaction().unwrap();
    SqliteDesignRepo::freeze_design(&tx, "Study_000001", 1).unwrap();
    let err = SqliteDesignRepo::freeze_design(&tx, "Study_000001", 1).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Concurrency);
}

#[test]
fn test_unknown_version_not_found() {
    let (_dir, mut conn) = setup_test_db();
    insert_study(&mut conn, "Study_000001");

    let err = SqliteDesignRepo::load_design(&conn, "Study_000001", Some(4)).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.version(), Some(4));
}

#[test]
fn test_design_requires_existing_study() {
    let (_dir, conn) = setup_test_db();
    let err = SqliteDesignRepo::save_draft_design(&conn, &StudyDesign::new("Study_404404"))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Persistence);
}
