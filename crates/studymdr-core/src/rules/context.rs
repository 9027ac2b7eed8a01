//! External existence checks for controlled terminology
//!
//! The aggregate never looks terms up itself. Callers pass a
//! `ValidationContext` into `create`/`edit`, and every controlled field is
//! checked through the method for its category.

use std::collections::{HashMap, HashSet};

/// Controlled vocabulary categories consulted during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermCategory {
    NullValue,
    StudyType,
    TrialPhase,
    TrialType,
    TrialIntentType,
    TherapeuticArea,
    DiagnosisGroup,
    DiseaseConditionOrIndication,
    SexOfParticipants,
    InterventionType,
    ControlType,
    InterventionModel,
    BlindingSchema,
}

/// One existence check per controlled field category
pub trait ValidationContext {
    fn project_exists(&self, project_number: &str) -> bool;

    /// Study id prefix configured for a project, if any
    fn study_id_prefix_for(&self, project_number: &str) -> Option<String>;

    fn null_value_code_exists(&self, code: &str) -> bool;
    fn study_type_exists(&self, code: &str) -> bool;
    fn trial_phase_exists(&self, code: &str) -> bool;
    fn trial_type_exists(&self, code: &str) -> bool;
    fn trial_intent_type_exists(&self, code: &str) -> bool;
    fn therapeutic_area_exists(&self, code: &str) -> bool;
    fn diagnosis_group_exists(&self, code: &str) -> bool;
    fn disease_condition_or_indication_exists(&self, code: &str) -> bool;
    fn sex_of_participants_exists(&self, code: &str) -> bool;
    fn intervention_type_exists(&self, code: &str) -> bool;
    fn control_type_exists(&self, code: &str) -> bool;
    fn intervention_model_exists(&self, code: &str) -> bool;
    fn blinding_schema_exists(&self, code: &str) -> bool;
}

/// Accepts every value
///
/// Prefixes are derived by a fixed rule (`"{project_number}"` itself)
/// unless a table is supplied with `with_prefix`.
#[derive(Debug, Clone, Default)]
pub struct PermissiveValidationContext {
    prefixes: HashMap<String, String>,
}

impl PermissiveValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, project_number: &str, prefix: &str) -> Self {
        self.prefixes
            .insert(project_number.to_string(), prefix.to_string());
        self
    }
}

impl ValidationContext for PermissiveValidationContext {
    fn project_exists(&self, _project_number: &str) -> bool {
        true
    }

    fn study_id_prefix_for(&self, project_number: &str) -> Option<String> {
        Some(
            self.prefixes
                .get(project_number)
                .cloned()
                .unwrap_or_else(|| project_number.to_string()),
        )
    }

    fn null_value_code_exists(&self, _code: &str) -> bool {
        true
    }
    fn study_type_exists(&self, _code: &str) -> bool {
        true
    }
    fn trial_phase_exists(&self, _code: &str) -> bool {
        true
    }
    fn trial_type_exists(&self, _code: &str) -> bool {
        true
    }
    fn trial_intent_type_exists(&self, _code: &str) -> bool {
        true
    }
    fn therapeutic_area_exists(&self, _code: &str) -> bool {
        true
    }
    fn diagnosis_group_exists(&self, _code: &str) -> bool {
        true
    }
    fn disease_condition_or_indication_exists(&self, _code: &str) -> bool {
        true
    }
    fn sex_of_participants_exists(&self, _code: &str) -> bool {
        true
    }
    fn intervention_type_exists(&self, _code: &str) -> bool {
        true
    }
    fn control_type_exists(&self, _code: &str) -> bool {
        true
    }
    fn intervention_model_exists(&self, _code: &str) -> bool {
        true
    }
    fn blinding_schema_exists(&self, _code: &str) -> bool {
        true
    }
}

/// In-memory codelists keyed by category
///
/// Categories with no registered terms reject every code.
#[derive(Debug, Clone, Default)]
pub struct CodelistValidationContext {
    projects: HashMap<String, Option<String>>,
    terms: HashMap<TermCategory, HashSet<String>>,
}

impl CodelistValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project and the study id prefix of its studies
    pub fn with_project(mut self, project_number: &str, prefix: Option<&str>) -> Self {
        self.projects
            .insert(project_number.to_string(), prefix.map(str::to_string));
        self
    }

    pub fn with_terms<I, S>(mut self, category: TermCategory, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms
            .entry(category)
            .or_default()
            .extend(codes.into_iter().map(Into::into));
        self
    }

    fn has(&self, category: TermCategory, code: &str) -> bool {
        self.terms
            .get(&category)
            .is_some_and(|codes| codes.contains(code))
    }
}

impl ValidationContext for CodelistValidationContext {
    fn project_exists(&self, project_number: &str) -> bool {
        self.projects.contains_key(project_number)
    }

    fn study_id_prefix_for(&self, project_number: &str) -> Option<String> {
        self.projects.get(project_number).cloned().flatten()
    }

    fn null_value_code_exists(&self, code: &str) -> bool {
        self.has(TermCategory::NullValue, code)
    }
    fn study_type_exists(&self, code: &str) -> bool {
        self.has(TermCategory::StudyType, code)
    }
    fn trial_phase_exists(&self, code: &str) -> bool {
        self.has(TermCategory::TrialPhase, code)
    }
    fn trial_type_exists(&self, code: &str) -> bool {
        self.has(TermCategory::TrialType, code)
    }
    fn trial_intent_type_exists(&self, code: &str) -> bool {
        self.has(TermCategory::TrialIntentType, code)
    }
    fn therapeutic_area_exists(&self, code: &str) -> bool {
        self.has(TermCategory::TherapeuticArea, code)
    }
    fn diagnosis_group_exists(&self, code: &str) -> bool {
        self.has(TermCategory::DiagnosisGroup, code)
    }
    fn disease_condition_or_indication_exists(&self, code: &str) -> bool {
        self.has(TermCategory::DiseaseConditionOrIndication, code)
    }
    fn sex_of_participants_exists(&self, code: &str) -> bool {
        self.has(TermCategory::SexOfParticipants, code)
    }
    fn intervention_type_exists(&self, code: &str) -> bool {
        self.has(TermCategory::InterventionType, code)
    }
    fn control_type_exists(&self, code: &str) -> bool {
        self.has(TermCategory::ControlType, code)
    }
    fn intervention_model_exists(&self, code: &str) -> bool {
        self.has(TermCategory::InterventionModel, code)
    }
    fn blinding_schema_exists(&self, code: &str) -> bool {
        self.has(TermCategory::BlindingSchema, code)
    }
}
