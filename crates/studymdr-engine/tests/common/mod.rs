#![allow(dead_code)]

use rusqlite::Connection;
use studymdr_core::flowchart::design::{
    StudyActivity, StudyActivityGroup, StudyActivitySchedule, StudyActivitySubGroup, StudyDesign,
    StudyEpoch, StudySoAGroup, StudyVisit,
};
use studymdr_core::model::{StudyFields, StudyIdentificationMetadata};
use studymdr_core::rules::PermissiveValidationContext;
use studymdr_core::StudyDefinition;
use studymdr_core_types::RequestContext;
use studymdr_engine::commands::flowchart::save_study_design;
use studymdr_engine::commands::study::create_study;
use studymdr_store::db::open_store;
use studymdr_store::repo::upsert_term;
use tempfile::TempDir;

pub fn setup_engine_db() -> (TempDir, Connection) {
    let temp_dir = TempDir::new().unwrap();
    let conn = open_store(temp_dir.path().join("engine.db")).unwrap();
    upsert_term(&conn, "CT_SCREENING", "Screening").unwrap();
    upsert_term(&conn, "CT_TREATMENT", "Treatment").unwrap();
    (temp_dir, conn)
}

pub fn ctx() -> PermissiveValidationContext {
    PermissiveValidationContext::new()
}

pub fn req() -> RequestContext {
    RequestContext::for_author("alice")
}

pub fn fields(study_number: &str) -> StudyFields {
    StudyFields {
        identification: StudyIdentificationMetadata {
            project_number: Some("123".to_string()),
            study_number: Some(study_number.to_string()),
            study_acronym: Some("ACR".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn new_study(conn: &mut Connection) -> StudyDefinition {
    create_study(conn, fields("0001"), &ctx(), &req()).unwrap()
}

fn visit(uid: &str, epoch_uid: &str, order: u32, day: i32) -> StudyVisit {
    StudyVisit {
        uid: uid.to_string(),
        epoch_uid: epoch_uid.to_string(),
        order,
        name: format!("Visit {}", uid),
        study_day: Some(day),
        study_week: Some(day.div_euclid(7) + 1),
        window_min: Some(-1),
        window_max: Some(1),
        show_visit: true,
    }
}

pub fn activity(uid: &str, order: u32, name: &str, show: bool) -> StudyActivity {
    StudyActivity {
        uid: uid.to_string(),
        activity_subgroup_uid: "ASG1".to_string(),
        name: name.to_string(),
        order,
        show_in_protocol_flowchart: show,
        is_request_placeholder: false,
    }
}

pub fn schedule(uid: &str, activity_uid: &str, visit_uid: &str) -> StudyActivitySchedule {
    StudyActivitySchedule {
        uid: uid.to_string(),
        study_activity_uid: activity_uid.to_string(),
        study_visit_uid: visit_uid.to_string(),
    }
}

/// Screening (V1 day -14, V2 day -7) and Treatment (V3 day 1); subgroup
/// "Body measurements" with visible "Weight" at V1/V3 and hidden
/// "Hidden lab" at V1
pub fn flowchart_design(study_uid: &str) -> StudyDesign {
    let mut d = StudyDesign::new(study_uid);
    d.add_epoch(StudyEpoch {
        uid: "E1".to_string(),
        term_uid: "CT_SCREENING".to_string(),
        order: 1,
    });
    d.add_epoch(StudyEpoch {
        uid: "E2".to_string(),
        term_uid: "CT_TREATMENT".to_string(),
        order: 2,
    });
    d.add_visit(visit("V1", "E1", 1, -14)).unwrap();
    d.add_visit(visit("V2", "E1", 2, -7)).unwrap();
    d.add_visit(visit("V3", "E2", 1, 1)).unwrap();
    d.add_soa_group(StudySoAGroup {
        uid: "SG1".to_string(),
        name: "Subject related info".to_string(),
        order: 1,
        show_in_protocol_flowchart: true,
    });
    d.add_activity_group(StudyActivityGroup {
        uid: "AG1".to_string(),
        soa_group_uid: "SG1".to_string(),
        name: "General".to_string(),
        order: 1,
        show_in_protocol_flowchart: true,
    })
    .unwrap();
    d.add_activity_subgroup(StudyActivitySubGroup {
        uid: "ASG1".to_string(),
        activity_group_uid: "AG1".to_string(),
        name: "Body measurements".to_string(),
        order: 1,
        show_in_protocol_flowchart: true,
    })
    .unwrap();
    d.add_activity(activity("A1", 1, "Weight", true)).unwrap();
    d.add_activity(activity("A2", 2, "Hidden lab", false)).unwrap();
    d.add_schedule(schedule("S1", "A1", "V1")).unwrap();
    d.add_schedule(schedule("S2", "A1", "V3")).unwrap();
    d.add_schedule(schedule("S3", "A2", "V1")).unwrap();
    d
}

/// New study with `flowchart_design` saved as its live design
pub fn study_with_design(conn: &mut Connection) -> String {
    let study = new_study(conn);
    let uid = study.uid().to_string();
    save_study_design(conn, &flowchart_design(&uid), &req()).unwrap();
    uid
}
