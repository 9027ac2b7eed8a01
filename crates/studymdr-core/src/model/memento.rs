//! Durable form of the study aggregate
//!
//! A `StudyDefinitionSnapshot` is what the persistence layer stores. Each
//! metadata version is flattened into a `StudyMetadataSnapshot` whose field
//! names mirror the value objects; nullable values become a pair
//! `<field>` / `<field>_null_value_code`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metadata::{
    HighLevelStudyDesign, NullableValue, RegistryIdentifiers, StudyDescription,
    StudyIdentificationMetadata, StudyIntervention, StudyMetadata, StudyPopulation, StudyStatus,
    StudyVersionMetadata,
};

/// Serialized aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyDefinitionSnapshot {
    pub uid: String,
    pub deleted: bool,
    /// Absent when the study is deleted
    pub current: Option<StudyMetadataSnapshot>,
    pub released: Option<StudyMetadataSnapshot>,
    /// Index 0 holds locked version 1
    pub locked_metadata_versions: Vec<StudyMetadataSnapshot>,
    pub study_status: StudyStatus,
}

/// One metadata version as a flat field bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMetadataSnapshot {
    // identification
    pub study_number: Option<String>,
    pub study_acronym: Option<String>,
    pub project_number: Option<String>,
    pub study_id_prefix: Option<String>,
    pub ct_gov_id: Option<String>,
    pub ct_gov_id_null_value_code: Option<String>,
    pub eudract_id: Option<String>,
    pub eudract_id_null_value_code: Option<String>,
    pub universal_trial_number_utn: Option<String>,
    pub universal_trial_number_utn_null_value_code: Option<String>,
    pub japanese_trial_registry_id_japic: Option<String>,
    pub japanese_trial_registry_id_japic_null_value_code: Option<String>,
    pub investigational_new_drug_application_number_ind: Option<String>,
    pub investigational_new_drug_application_number_ind_null_value_code: Option<String>,
    pub eu_trial_number: Option<String>,
    pub eu_trial_number_null_value_code: Option<String>,
    pub civ_id_sin_number: Option<String>,
    pub civ_id_sin_number_null_value_code: Option<String>,
    pub national_medical_products_administration_nmpa_number: Option<String>,
    pub national_medical_products_administration_nmpa_number_null_value_code: Option<String>,

    // high level study design
    pub study_type_code: Option<String>,
    pub study_type_null_value_code: Option<String>,
    pub trial_phase_code: Option<String>,
    pub trial_phase_null_value_code: Option<String>,
    pub trial_type_codes: Option<Vec<String>>,
    pub trial_type_null_value_code: Option<String>,
    pub trial_intent_type_codes: Option<Vec<String>>,
    pub trial_intent_type_null_value_code: Option<String>,
    pub is_adaptive_design: Option<bool>,
    pub is_adaptive_design_null_value_code: Option<String>,
    pub is_extension_trial: Option<bool>,
    pub is_extension_trial_null_value_code: Option<String>,
    pub study_stop_rules: Option<String>,
    pub study_stop_rules_null_value_code: Option<String>,

    // population
    pub therapeutic_area_codes: Option<Vec<String>>,
    pub therapeutic_area_null_value_code: Option<String>,
    pub diagnosis_group_codes: Option<Vec<String>>,
    pub diagnosis_group_null_value_code: Option<String>,
    pub disease_condition_or_indication_codes: Option<Vec<String>>,
    pub disease_condition_or_indication_null_value_code: Option<String>,
    pub sex_of_participants_code: Option<String>,
    pub sex_of_participants_null_value_code: Option<String>,
    pub healthy_subject_indicator: Option<bool>,
    pub healthy_subject_indicator_null_value_code: Option<String>,
    pub planned_minimum_age: Option<String>,
    pub planned_minimum_age_null_value_code: Option<String>,
    pub planned_maximum_age: Option<String>,
    pub planned_maximum_age_null_value_code: Option<String>,
    pub pediatric_study_indicator: Option<bool>,
    pub pediatric_study_indicator_null_value_code: Option<String>,

    // intervention
    pub intervention_type_code: Option<String>,
    pub intervention_type_null_value_code: Option<String>,
    pub control_type_code: Option<String>,
    pub control_type_null_value_code: Option<String>,
    pub intervention_model_code: Option<String>,
    pub intervention_model_null_value_code: Option<String>,
    pub blinding_schema_code: Option<String>,
    pub blinding_schema_null_value_code: Option<String>,
    pub is_trial_randomised: Option<bool>,
    pub is_trial_randomised_null_value_code: Option<String>,
    pub stratification_factor: Option<String>,
    pub stratification_factor_null_value_code: Option<String>,
    pub add_on_to_existing_treatments: Option<bool>,
    pub add_on_to_existing_treatments_null_value_code: Option<String>,

    // description
    pub study_title: Option<String>,
    pub study_short_title: Option<String>,

    // version
    pub study_status: StudyStatus,
    pub locked_version_number: Option<u32>,
    pub version_timestamp: DateTime<Utc>,
    pub version_author: Option<String>,
    pub version_description: Option<String>,
}

fn split<T: Clone>(nv: &NullableValue<T>) -> (Option<T>, Option<String>) {
    (nv.value.clone(), nv.null_value_code.clone())
}

fn join<T>(value: Option<T>, null_value_code: Option<String>) -> NullableValue<T> {
    NullableValue {
        value,
        null_value_code,
    }
}

impl From<&StudyMetadata> for StudyMetadataSnapshot {
    fn from(m: &StudyMetadata) -> Self {
        let ident = &m.identification;
        let reg = &ident.registry_identifiers;
        let design = &m.high_level_study_design;
        let pop = &m.study_population;
        let interv = &m.study_intervention;

        let (ct_gov_id, ct_gov_id_null_value_code) = split(&reg.ct_gov_id);
        let (eudract_id, eudract_id_null_value_code) = split(&reg.eudract_id);
        let (universal_trial_number_utn, universal_trial_number_utn_null_value_code) =
            split(&reg.universal_trial_number_utn);
        let (japanese_trial_registry_id_japic, japanese_trial_registry_id_japic_null_value_code) =
            split(&reg.japanese_trial_registry_id_japic);
        let (
            investigational_new_drug_application_number_ind,
            investigational_new_drug_application_number_ind_null_value_code,
        ) = split(&reg.investigational_new_drug_application_number_ind);
        let (eu_trial_number, eu_trial_number_null_value_code) = split(&reg.eu_trial_number);
        let (civ_id_sin_number, civ_id_sin_number_null_value_code) = split(&reg.civ_id_sin_number);
        let (
            national_medical_products_administration_nmpa_number,
            national_medical_products_administration_nmpa_number_null_value_code,
        ) = split(&reg.national_medical_products_administration_nmpa_number);

        let (study_type_code, study_type_null_value_code) = split(&design.study_type_code);
        let (trial_phase_code, trial_phase_null_value_code) = split(&design.trial_phase_code);
        let (trial_type_codes, trial_type_null_value_code) = split(&design.trial_type_codes);
        let (trial_intent_type_codes, trial_intent_type_null_value_code) =
            split(&design.trial_intent_type_codes);
        let (is_adaptive_design, is_adaptive_design_null_value_code) =
            split(&design.is_adaptive_design);
        let (is_extension_trial, is_extension_trial_null_value_code) =
            split(&design.is_extension_trial);
        let (study_stop_rules, study_stop_rules_null_value_code) = split(&design.study_stop_rules);

        let (therapeutic_area_codes, therapeutic_area_null_value_code) =
            split(&pop.therapeutic_area_codes);
        let (diagnosis_group_codes, diagnosis_group_null_value_code) =
            split(&pop.diagnosis_group_codes);
        let (disease_condition_or_indication_codes, disease_condition_or_indication_null_value_code) =
            split(&pop.disease_condition_or_indication_codes);
        let (sex_of_participants_code, sex_of_participants_null_value_code) =
            split(&pop.sex_of_participants_code);
        let (healthy_subject_indicator, healthy_subject_indicator_null_value_code) =
            split(&pop.healthy_subject_indicator);
        let (planned_minimum_age, planned_minimum_age_null_value_code) =
            split(&pop.planned_minimum_age);
        let (planned_maximum_age, planned_maximum_age_null_value_code) =
            split(&pop.planned_maximum_age);
        let (pediatric_study_indicator, pediatric_study_indicator_null_value_code) =
            split(&pop.pediatric_study_indicator);

        let (intervention_type_code, intervention_type_null_value_code) =
            split(&interv.intervention_type_code);
        let (control_type_code, control_type_null_value_code) = split(&interv.control_type_code);
        let (intervention_model_code, intervention_model_null_value_code) =
            split(&interv.intervention_model_code);
        let (blinding_schema_code, blinding_schema_null_value_code) =
            split(&interv.blinding_schema_code);
        let (is_trial_randomised, is_trial_randomised_null_value_code) =
            split(&interv.is_trial_randomised);
        let (stratification_factor, stratification_factor_null_value_code) =
            split(&interv.stratification_factor);
        let (add_on_to_existing_treatments, add_on_to_existing_treatments_null_value_code) =
            split(&interv.add_on_to_existing_treatments);

        Self {
            study_number: ident.study_number.clone(),
            study_acronym: ident.study_acronym.clone(),
            project_number: ident.project_number.clone(),
            study_id_prefix: ident.study_id_prefix.clone(),
            ct_gov_id,
            ct_gov_id_null_value_code,
            eudract_id,
            eudract_id_null_value_code,
            universal_trial_number_utn,
            universal_trial_number_utn_null_value_code,
            japanese_trial_registry_id_japic,
            japanese_trial_registry_id_japic_null_value_code,
            investigational_new_drug_application_number_ind,
            investigational_new_drug_application_number_ind_null_value_code,
            eu_trial_number,
            eu_trial_number_null_value_code,
            civ_id_sin_number,
            civ_id_sin_number_null_value_code,
            national_medical_products_administration_nmpa_number,
            national_medical_products_administration_nmpa_number_null_value_code,
            study_type_code,
            study_type_null_value_code,
            trial_phase_code,
            trial_phase_null_value_code,
            trial_type_codes,
            trial_type_null_value_code,
            trial_intent_type_codes,
            trial_intent_type_null_value_code,
            is_adaptive_design,
            is_adaptive_design_null_value_code,
            is_extension_trial,
            is_extension_trial_null_value_code,
            study_stop_rules,
            study_stop_rules_null_value_code,
            therapeutic_area_codes,
            therapeutic_area_null_value_code,
            diagnosis_group_codes,
            diagnosis_group_null_value_code,
            disease_condition_or_indication_codes,
            disease_condition_or_indication_null_value_code,
            sex_of_participants_code,
            sex_of_participants_null_value_code,
            healthy_subject_indicator,
            healthy_subject_indicator_null_value_code,
            planned_minimum_age,
            planned_minimum_age_null_value_code,
            planned_maximum_age,
            planned_maximum_age_null_value_code,
            pediatric_study_indicator,
            pediatric_study_indicator_null_value_code,
            intervention_type_code,
            intervention_type_null_value_code,
            control_type_code,
            control_type_null_value_code,
            intervention_model_code,
            intervention_model_null_value_code,
            blinding_schema_code,
            blinding_schema_null_value_code,
            is_trial_randomised,
            is_trial_randomised_null_value_code,
            stratification_factor,
            stratification_factor_null_value_code,
            add_on_to_existing_treatments,
            add_on_to_existing_treatments_null_value_code,
            study_title: m.study_description.study_title.clone(),
            study_short_title: m.study_description.study_short_title.clone(),
            study_status: m.version.study_status,
            locked_version_number: m.version.locked_version_number,
            version_timestamp: m.version.version_timestamp,
            version_author: m.version.version_author.clone(),
            version_description: m.version.version_description.clone(),
        }
    }
}

impl From<StudyMetadataSnapshot> for StudyMetadata {
    fn from(s: StudyMetadataSnapshot) -> Self {
        Self {
            identification: StudyIdentificationMetadata {
                study_number: s.study_number,
                study_acronym: s.study_acronym,
                project_number: s.project_number,
                study_id_prefix: s.study_id_prefix,
                registry_identifiers: RegistryIdentifiers {
                    ct_gov_id: join(s.ct_gov_id, s.ct_gov_id_null_value_code),
                    eudract_id: join(s.eudract_id, s.eudract_id_null_value_code),
                    universal_trial_number_utn: join(
                        s.universal_trial_number_utn,
                        s.universal_trial_number_utn_null_value_code,
                    ),
                    japanese_trial_registry_id_japic: join(
                        s.japanese_trial_registry_id_japic,
                        s.japanese_trial_registry_id_japic_null_value_code,
                    ),
                    investigational_new_drug_application_number_ind: join(
                        s.investigational_new_drug_application_number_ind,
                        s.investigational_new_drug_application_number_ind_null_value_code,
                    ),
                    eu_trial_number: join(s.eu_trial_number, s.eu_trial_number_null_value_code),
                    civ_id_sin_number: join(
                        s.civ_id_sin_number,
                        s.civ_id_sin_number_null_value_code,
                    ),
                    national_medical_products_administration_nmpa_number: join(
                        s.national_medical_products_administration_nmpa_number,
                        s.national_medical_products_administration_nmpa_number_null_value_code,
                    ),
                },
            },
            high_level_study_design: HighLevelStudyDesign {
                study_type_code: join(s.study_type_code, s.study_type_null_value_code),
                trial_phase_code: join(s.trial_phase_code, s.trial_phase_null_value_code),
                trial_type_codes: join(s.trial_type_codes, s.trial_type_null_value_code),
                trial_intent_type_codes: join(
                    s.trial_intent_type_codes,
                    s.trial_intent_type_null_value_code,
                ),
                is_adaptive_design: join(s.is_adaptive_design, s.is_adaptive_design_null_value_code),
                is_extension_trial: join(s.is_extension_trial, s.is_extension_trial_null_value_code),
                study_stop_rules: join(s.study_stop_rules, s.study_stop_rules_null_value_code),
            },
            study_population: StudyPopulation {
                therapeutic_area_codes: join(
                    s.therapeutic_area_codes,
                    s.therapeutic_area_null_value_code,
                ),
                diagnosis_group_codes: join(
                    s.diagnosis_group_codes,
                    s.diagnosis_group_null_value_code,
                ),
                disease_condition_or_indication_codes: join(
                    s.disease_condition_or_indication_codes,
                    s.disease_condition_or_indication_null_value_code,
                ),
                sex_of_participants_code: join(
                    s.sex_of_participants_code,
                    s.sex_of_participants_null_value_code,
                ),
                healthy_subject_indicator: join(
                    s.healthy_subject_indicator,
                    s.healthy_subject_indicator_null_value_code,
                ),
                planned_minimum_age: join(
                    s.planned_minimum_age,
                    s.planned_minimum_age_null_value_code,
                ),
                planned_maximum_age: join(
                    s.planned_maximum_age,
                    s.planned_maximum_age_null_value_code,
                ),
                pediatric_study_indicator: join(
                    s.pediatric_study_indicator,
                    s.pediatric_study_indicator_null_value_code,
                ),
            },
            study_intervention: StudyIntervention {
                intervention_type_code: join(
                    s.intervention_type_code,
                    s.intervention_type_null_value_code,
                ),
                control_type_code: join(s.control_type_code, s.control_type_null_value_code),
                intervention_model_code: join(
                    s.intervention_model_code,
                    s.intervention_model_null_value_code,
                ),
                blinding_schema_code: join(
                    s.blinding_schema_code,
                    s.blinding_schema_null_value_code,
                ),
                is_trial_randomised: join(
                    s.is_trial_randomised,
                    s.is_trial_randomised_null_value_code,
                ),
                stratification_factor: join(
                    s.stratification_factor,
                    s.stratification_factor_null_value_code,
                ),
                add_on_to_existing_treatments: join(
                    s.add_on_to_existing_treatments,
                    s.add_on_to_existing_treatments_null_value_code,
                ),
            },
            study_description: StudyDescription {
                study_title: s.study_title,
                study_short_title: s.study_short_title,
            },
            version: StudyVersionMetadata {
                study_status: s.study_status,
                locked_version_number: s.locked_version_number,
                version_timestamp: s.version_timestamp,
                version_author: s.version_author,
                version_description: s.version_description,
            },
        }
    }
}

impl StudyDefinitionSnapshot {
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
