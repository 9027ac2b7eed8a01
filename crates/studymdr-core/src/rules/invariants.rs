//! Structural invariants of a serialized study aggregate
//!
//! Each `find_*` function reports every violation it sees as a human
//! readable reason. `validation::validate_study_snapshot` turns the first
//! one into an error.

use crate::model::memento::StudyDefinitionSnapshot;
use crate::model::metadata::StudyStatus;

/// Locked entries whose number is not `index + 1` or whose status is not LOCKED
pub fn find_locked_numbering_gaps(snapshot: &StudyDefinitionSnapshot) -> Vec<String> {
    let mut reasons = Vec::new();
    for (index, locked) in snapshot.locked_metadata_versions.iter().enumerate() {
        let expected = index as u32 + 1;
        if locked.locked_version_number != Some(expected) {
            reasons.push(format!(
                "locked entry {} carries version number {:?}, expected {}",
                index, locked.locked_version_number, expected
            ));
        }
        if locked.study_status != StudyStatus::Locked {
            reasons.push(format!(
                "locked entry {} has status {}",
                index, locked.study_status
            ));
        }
    }
    reasons
}

/// Mismatches between the aggregate status and its current metadata
pub fn find_status_mismatches(snapshot: &StudyDefinitionSnapshot) -> Vec<String> {
    let mut reasons = Vec::new();

    if snapshot.deleted {
        if snapshot.current.is_some() {
            reasons.push("deleted study still carries current metadata".to_string());
        }
        if !snapshot.locked_metadata_versions.is_empty() {
            reasons.push("deleted study has locked versions".to_string());
        }
        return reasons;
    }

    let Some(current) = &snapshot.current else {
        reasons.push("current metadata is missing".to_string());
        return reasons;
    };

    match snapshot.study_status {
        StudyStatus::Draft => {
            if current.study_status != StudyStatus::Draft {
                reasons.push(format!(
                    "study status DRAFT but current metadata is {}",
                    current.study_status
                ));
            }
            if current.locked_version_number.is_some() {
                reasons.push("draft metadata carries a locked version number".to_string());
            }
        }
        StudyStatus::Locked => match snapshot.locked_metadata_versions.last() {
            Some(last) if last == current => {}
            Some(_) => reasons.push("current metadata differs from last locked version".to_string()),
            None => reasons.push("study status LOCKED without locked versions".to_string()),
        },
        StudyStatus::Released => {
            reasons.push("RELEASED is not a valid aggregate status".to_string());
        }
    }
    reasons
}

/// A released copy outside DRAFT, or one that is not marked RELEASED
pub fn find_misplaced_release(snapshot: &StudyDefinitionSnapshot) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(released) = &snapshot.released {
        if snapshot.deleted || snapshot.study_status != StudyStatus::Draft {
            reasons.push(format!(
                "released metadata present while study is {}",
                snapshot.study_status
            ));
        }
        if released.study_status != StudyStatus::Released {
            reasons.push(format!(
                "released metadata has status {}",
                released.study_status
            ));
        }
    }
    reasons
}
