#![allow(dead_code)]

use studymdr_core::flowchart::design::{
    FootnoteTarget, SoAItemType, StudyActivity, StudyActivityGroup, StudyActivityInstance,
    StudyActivitySchedule, StudyActivitySubGroup, StudyDesign, StudyEpoch, StudySoAFootnote,
    StudySoAGroup, StudyVisit,
};
use studymdr_core::model::{StudyFields, StudyIdentificationMetadata};
use studymdr_core::rules::PermissiveValidationContext;
use studymdr_core::StudyDefinition;

pub fn permissive() -> PermissiveValidationContext {
    PermissiveValidationContext::new()
}

pub fn study_fields(project_number: &str, study_number: &str) -> StudyFields {
    StudyFields {
        identification: StudyIdentificationMetadata {
            project_number: Some(project_number.to_string()),
            study_number: Some(study_number.to_string()),
            study_acronym: Some("ACR".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// DRAFT study `Study_000001` for project "123", number "0001"
pub fn new_study() -> StudyDefinition {
    StudyDefinition::create(study_fields("123", "0001"), &permissive(), &|| {
        "Study_000001".to_string()
    })
    .unwrap()
}

pub fn epoch(uid: &str, term_uid: &str, order: u32) -> StudyEpoch {
    StudyEpoch {
        uid: uid.to_string(),
        term_uid: term_uid.to_string(),
        order,
    }
}

pub fn visit(uid: &str, epoch_uid: &str, order: u32, day: i32) -> StudyVisit {
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

pub fn activity(uid: &str, subgroup_uid: &str, order: u32, name: &str, show: bool) -> StudyActivity {
    StudyActivity {
        uid: uid.to_string(),
        activity_subgroup_uid: subgroup_uid.to_string(),
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

/// Two epochs, three visits (V1, V2 in E1; V3 in E2), one SoA group with
/// one activity group and one subgroup holding:
/// - A1 "Weight" (visible) at V1 and V3
/// - A2 "Hidden lab" (hidden) at V1
pub fn two_epoch_design(study_uid: &str) -> StudyDesign {
    let mut d = StudyDesign::new(study_uid);
    d.add_epoch(epoch("E1", "CT_SCREENING", 1));
    d.add_epoch(epoch("E2", "CT_TREATMENT", 2));
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
    d.add_activity(activity("A1", "ASG1", 1, "Weight", true)).unwrap();
    d.add_activity(activity("A2", "ASG1", 2, "Hidden lab", false)).unwrap();
    d.add_schedule(schedule("S1", "A1", "V1")).unwrap();
    d.add_schedule(schedule("S2", "A1", "V3")).unwrap();
    d.add_schedule(schedule("S3", "A2", "V1")).unwrap();
    d
}

pub fn instance(uid: &str, activity_uid: &str, order: u32, name: &str) -> StudyActivityInstance {
    StudyActivityInstance {
        uid: uid.to_string(),
        study_activity_uid: activity_uid.to_string(),
        name: name.to_string(),
        order,
        show_in_protocol_flowchart: true,
    }
}

pub fn footnote(uid: &str, order: u32, text: &str, targets: &[(SoAItemType, &str)]) -> StudySoAFootnote {
    StudySoAFootnote {
        uid: uid.to_string(),
        order,
        text: text.to_string(),
        referenced_items: targets
            .iter()
            .map(|(item_type, uid)| FootnoteTarget {
                item_type: *item_type,
                item_uid: uid.to_string(),
            })
            .collect(),
    }
}
