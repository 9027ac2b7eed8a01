use crate::errors::{Result, StudyError};
use crate::model::memento::StudyDefinitionSnapshot;
use crate::model::metadata::{
    HighLevelStudyDesign, NullableValue, StudyIdentificationMetadata, StudyIntervention,
    StudyPopulation,
};

use super::context::ValidationContext;
use super::invariants;

fn failed(field: &str, value: &str) -> StudyError {
    StudyError::ValidationFailed {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Check a nullable controlled code and its null reason
fn check_code(
    ctx: &dyn ValidationContext,
    field: &str,
    nv: &NullableValue<String>,
    exists: impl Fn(&str) -> bool,
) -> Result<()> {
    if let Some(code) = &nv.value {
        if !exists(code) {
            return Err(failed(field, code));
        }
    }
    check_null_reason(ctx, field, nv)
}

/// Check every code of a nullable code list and its null reason
fn check_codes(
    ctx: &dyn ValidationContext,
    field: &str,
    nv: &NullableValue<Vec<String>>,
    exists: impl Fn(&str) -> bool,
) -> Result<()> {
    if let Some(code) = nv.value.iter().flatten().find(|code| !exists(code)) {
        return Err(failed(field, code));
    }
    check_null_reason(ctx, field, nv)
}

fn check_null_reason<T>(
    ctx: &dyn ValidationContext,
    field: &str,
    nv: &NullableValue<T>,
) -> Result<()> {
    match &nv.null_value_code {
        Some(code) if !ctx.null_value_code_exists(code) => {
            Err(failed(&format!("{}_null_value_code", field), code))
        }
        _ => Ok(()),
    }
}

/// Validate identification fields
///
/// 1. The project must exist
/// 2. Every registry identifier's null reason must be a known null-value code
///
/// The study id prefix is not checked here; it is derived, never supplied.
pub fn validate_identification(
    ident: &StudyIdentificationMetadata,
    ctx: &dyn ValidationContext,
) -> Result<()> {
    if let Some(project_number) = &ident.project_number {
        if !ctx.project_exists(project_number) {
            return Err(failed("project_number", project_number));
        }
    }
    for (field, nv) in ident.registry_identifiers.entries() {
        check_null_reason(ctx, field, nv)?;
    }
    Ok(())
}

pub fn validate_high_level_study_design(
    design: &HighLevelStudyDesign,
    ctx: &dyn ValidationContext,
) -> Result<()> {
    check_code(ctx, "study_type_code", &design.study_type_code, |c| {
        ctx.study_type_exists(c)
    })?;
    check_code(ctx, "trial_phase_code", &design.trial_phase_code, |c| {
        ctx.trial_phase_exists(c)
    })?;
    check_codes(ctx, "trial_type_codes", &design.trial_type_codes, |c| {
        ctx.trial_type_exists(c)
    })?;
    check_codes(
        ctx,
        "trial_intent_type_codes",
        &design.trial_intent_type_codes,
        |c| ctx.trial_intent_type_exists(c),
    )?;
    check_null_reason(ctx, "is_adaptive_design", &design.is_adaptive_design)?;
    check_null_reason(ctx, "is_extension_trial", &design.is_extension_trial)?;
    check_null_reason(ctx, "study_stop_rules", &design.study_stop_rules)
}

pub fn validate_study_population(
    population: &StudyPopulation,
    ctx: &dyn ValidationContext,
) -> Result<()> {
    check_codes(
        ctx,
        "therapeutic_area_codes",
        &population.therapeutic_area_codes,
        |c| ctx.therapeutic_area_exists(c),
    )?;
    check_codes(
        ctx,
        "diagnosis_group_codes",
        &population.diagnosis_group_codes,
        |c| ctx.diagnosis_group_exists(c),
    )?;
    check_codes(
        ctx,
        "disease_condition_or_indication_codes",
        &population.disease_condition_or_indication_codes,
        |c| ctx.disease_condition_or_indication_exists(c),
    )?;
    check_code(
        ctx,
        "sex_of_participants_code",
        &population.sex_of_participants_code,
        |c| ctx.sex_of_participants_exists(c),
    )?;
    check_null_reason(
        ctx,
        "healthy_subject_indicator",
        &population.healthy_subject_indicator,
    )?;
    check_null_reason(ctx, "planned_minimum_age", &population.planned_minimum_age)?;
    check_null_reason(ctx, "planned_maximum_age", &population.planned_maximum_age)?;
    check_null_reason(
        ctx,
        "pediatric_study_indicator",
        &population.pediatric_study_indicator,
    )
}

pub fn validate_study_intervention(
    intervention: &StudyIntervention,
    ctx: &dyn ValidationContext,
) -> Result<()> {
    check_code(
        ctx,
        "intervention_type_code",
        &intervention.intervention_type_code,
        |c| ctx.intervention_type_exists(c),
    )?;
    check_code(
        ctx,
        "control_type_code",
        &intervention.control_type_code,
        |c| ctx.control_type_exists(c),
    )?;
    check_code(
        ctx,
        "intervention_model_code",
        &intervention.intervention_model_code,
        |c| ctx.intervention_model_exists(c),
    )?;
    check_code(
        ctx,
        "blinding_schema_code",
        &intervention.blinding_schema_code,
        |c| ctx.blinding_schema_exists(c),
    )?;
    check_null_reason(
        ctx,
        "is_trial_randomised",
        &intervention.is_trial_randomised,
    )?;
    check_null_reason(
        ctx,
        "stratification_factor",
        &intervention.stratification_factor,
    )?;
    check_null_reason(
        ctx,
        "add_on_to_existing_treatments",
        &intervention.add_on_to_existing_treatments,
    )
}

/// Validate the structure of a serialized aggregate
///
/// No business validation happens on rehydration; only the shape is
/// checked:
///
/// 1. Locked entries are numbered 1, 2, 3... and marked LOCKED
/// 2. DRAFT studies have draft current metadata; LOCKED studies have
///    current metadata equal to the last locked version
/// 3. A released copy only exists next to a draft
/// 4. Deleted studies carry neither current metadata nor locked versions
///
/// # Errors
/// `InconsistentSnapshot` with the first violation found.
pub fn validate_study_snapshot(snapshot: &StudyDefinitionSnapshot) -> Result<()> {
    let first = invariants::find_locked_numbering_gaps(snapshot)
        .into_iter()
        .chain(invariants::find_status_mismatches(snapshot))
        .chain(invariants::find_misplaced_release(snapshot))
        .next();

    match first {
        Some(reason) => Err(StudyError::InconsistentSnapshot {
            study_uid: snapshot.uid.clone(),
            reason,
        }),
        None => Ok(()),
    }
}
