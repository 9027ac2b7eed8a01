//! Study metadata value objects
//!
//! Every version of a study (draft, released, each locked version) is one
//! immutable `StudyMetadata` bundle. Field groups are replaced wholesale on
//! edit; nothing here is mutated in place once it belongs to an aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value that may be absent for a recorded reason
///
/// `null_value_code` holds the controlled term explaining the absence
/// (e.g. "not applicable"). Both parts may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullableValue<T> {
    pub value: Option<T>,
    pub null_value_code: Option<String>,
}

impl<T> NullableValue<T> {
    pub fn of(value: T) -> Self {
        Self {
            value: Some(value),
            null_value_code: None,
        }
    }

    pub fn null_because(code: impl Into<String>) -> Self {
        Self {
            value: None,
            null_value_code: Some(code.into()),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.value.is_none() && self.null_value_code.is_none()
    }
}

// Manual impl: derive would require T: Default
impl<T> Default for NullableValue<T> {
    fn default() -> Self {
        Self {
            value: None,
            null_value_code: None,
        }
    }
}

/// Trial registry identifiers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryIdentifiers {
    pub ct_gov_id: NullableValue<String>,
    pub eudract_id: NullableValue<String>,
    pub universal_trial_number_utn: NullableValue<String>,
    pub japanese_trial_registry_id_japic: NullableValue<String>,
    pub investigational_new_drug_application_number_ind: NullableValue<String>,
    pub eu_trial_number: NullableValue<String>,
    pub civ_id_sin_number: NullableValue<String>,
    pub national_medical_products_administration_nmpa_number: NullableValue<String>,
}

impl RegistryIdentifiers {
    /// (field name, identifier) pairs in declaration order
    pub fn entries(&self) -> [(&'static str, &NullableValue<String>); 8] {
        [
            ("ct_gov_id", &self.ct_gov_id),
            ("eudract_id", &self.eudract_id),
            ("universal_trial_number_utn", &self.universal_trial_number_utn),
            (
                "japanese_trial_registry_id_japic",
                &self.japanese_trial_registry_id_japic,
            ),
            (
                "investigational_new_drug_application_number_ind",
                &self.investigational_new_drug_application_number_ind,
            ),
            ("eu_trial_number", &self.eu_trial_number),
            ("civ_id_sin_number", &self.civ_id_sin_number),
            (
                "national_medical_products_administration_nmpa_number",
                &self.national_medical_products_administration_nmpa_number,
            ),
        ]
    }
}

/// Who the study is and which project it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyIdentificationMetadata {
    pub study_number: Option<String>,
    pub study_acronym: Option<String>,
    pub project_number: Option<String>,
    /// Derived from the project; never taken from caller input
    pub study_id_prefix: Option<String>,
    pub registry_identifiers: RegistryIdentifiers,
}

impl StudyIdentificationMetadata {
    /// `"{prefix}-{number}"`, when both parts are known
    pub fn study_id(&self) -> Option<String> {
        match (&self.study_id_prefix, &self.study_number) {
            (Some(prefix), Some(number)) => Some(format!("{}-{}", prefix, number)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighLevelStudyDesign {
    pub study_type_code: NullableValue<String>,
    pub trial_phase_code: NullableValue<String>,
    pub trial_type_codes: NullableValue<Vec<String>>,
    pub trial_intent_type_codes: NullableValue<Vec<String>>,
    pub is_adaptive_design: NullableValue<bool>,
    pub is_extension_trial: NullableValue<bool>,
    pub study_stop_rules: NullableValue<String>,
}

/// Planned population
///
/// Ages are ISO-8601 durations as entered (`"P18Y"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyPopulation {
    pub therapeutic_area_codes: NullableValue<Vec<String>>,
    pub diagnosis_group_codes: NullableValue<Vec<String>>,
    pub disease_condition_or_indication_codes: NullableValue<Vec<String>>,
    pub sex_of_participants_code: NullableValue<String>,
    pub healthy_subject_indicator: NullableValue<bool>,
    pub planned_minimum_age: NullableValue<String>,
    pub planned_maximum_age: NullableValue<String>,
    pub pediatric_study_indicator: NullableValue<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyIntervention {
    pub intervention_type_code: NullableValue<String>,
    pub control_type_code: NullableValue<String>,
    pub intervention_model_code: NullableValue<String>,
    pub blinding_schema_code: NullableValue<String>,
    pub is_trial_randomised: NullableValue<bool>,
    pub stratification_factor: NullableValue<String>,
    pub add_on_to_existing_treatments: NullableValue<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudyDescription {
    pub study_title: Option<String>,
    pub study_short_title: Option<String>,
}

/// Lifecycle status of one metadata version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyStatus {
    Draft,
    Released,
    Locked,
}

impl StudyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyStatus::Draft => "DRAFT",
            StudyStatus::Released => "RELEASED",
            StudyStatus::Locked => "LOCKED",
        }
    }
}

impl fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status and provenance of one metadata version
///
/// `locked_version_number` is present exactly when the status is LOCKED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyVersionMetadata {
    pub study_status: StudyStatus,
    pub locked_version_number: Option<u32>,
    pub version_timestamp: DateTime<Utc>,
    pub version_author: Option<String>,
    pub version_description: Option<String>,
}

impl StudyVersionMetadata {
    pub fn draft(timestamp: DateTime<Utc>) -> Self {
        Self {
            study_status: StudyStatus::Draft,
            locked_version_number: None,
            version_timestamp: timestamp,
            version_author: None,
            version_description: None,
        }
    }

    pub fn released(timestamp: DateTime<Utc>, author: Option<String>) -> Self {
        Self {
            study_status: StudyStatus::Released,
            locked_version_number: None,
            version_timestamp: timestamp,
            version_author: author,
            version_description: None,
        }
    }

    pub fn locked(
        number: u32,
        timestamp: DateTime<Utc>,
        author: Option<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            study_status: StudyStatus::Locked,
            locked_version_number: Some(number),
            version_timestamp: timestamp,
            version_author: author,
            version_description: description,
        }
    }
}

/// One complete version of a study's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyMetadata {
    pub identification: StudyIdentificationMetadata,
    pub high_level_study_design: HighLevelStudyDesign,
    pub study_population: StudyPopulation,
    pub study_intervention: StudyIntervention,
    pub study_description: StudyDescription,
    pub version: StudyVersionMetadata,
}

impl StudyMetadata {
    pub fn status(&self) -> StudyStatus {
        self.version.study_status
    }

    pub fn study_id(&self) -> Option<String> {
        self.identification.study_id()
    }

    /// Same content under a different version header
    pub fn with_version(&self, version: StudyVersionMetadata) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }
}

/// Field groups supplied when a study is created
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudyFields {
    pub identification: StudyIdentificationMetadata,
    pub high_level_study_design: HighLevelStudyDesign,
    pub study_population: StudyPopulation,
    pub study_intervention: StudyIntervention,
    pub study_description: StudyDescription,
}

/// Partial update: each present group replaces the draft's group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudyMetadataPatch {
    pub identification: Option<StudyIdentificationMetadata>,
    pub high_level_study_design: Option<HighLevelStudyDesign>,
    pub study_population: Option<StudyPopulation>,
    pub study_intervention: Option<StudyIntervention>,
    pub study_description: Option<StudyDescription>,
}

impl StudyMetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.identification.is_none()
            && self.high_level_study_design.is_none()
            && self.study_population.is_none()
            && self.study_intervention.is_none()
            && self.study_description.is_none()
    }

    pub fn with_identification(mut self, identification: StudyIdentificationMetadata) -> Self {
        self.identification = Some(identification);
        self
    }

    pub fn with_high_level_study_design(mut self, design: HighLevelStudyDesign) -> Self {
        self.high_level_study_design = Some(design);
        self
    }

    pub fn with_study_population(mut self, population: StudyPopulation) -> Self {
        self.study_population = Some(population);
        self
    }

    pub fn with_study_intervention(mut self, intervention: StudyIntervention) -> Self {
        self.study_intervention = Some(intervention);
        self
    }

    pub fn with_study_description(mut self, description: StudyDescription) -> Self {
        self.study_description = Some(description);
        self
    }
}
