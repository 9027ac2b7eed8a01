use chrono::{DateTime, Utc};

use crate::errors::{Result, StudyError};
use crate::rules::validation::{
    validate_high_level_study_design, validate_identification, validate_study_intervention,
    validate_study_population, validate_study_snapshot,
};
use crate::rules::ValidationContext;
use crate::uid::UidGenerator;

use super::memento::{StudyDefinitionSnapshot, StudyMetadataSnapshot};
use super::metadata::{
    StudyFields, StudyIdentificationMetadata, StudyMetadata, StudyMetadataPatch, StudyStatus,
    StudyVersionMetadata,
};

/// Bookkeeping the repository attaches to a loaded aggregate
///
/// The aggregate carries it untouched; the repository compares it with
/// the persisted state on save to detect concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryClosureData {
    pub persisted_locked_count: usize,
}

/// Versioned study definition aggregate
///
/// Holds at most one draft, at most one released copy (only alongside a
/// draft) and the append-only list of locked versions. When there is no
/// draft the study is LOCKED and its current metadata is the last locked
/// version.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyDefinition {
    uid: String,
    draft: Option<StudyMetadata>,
    released: Option<StudyMetadata>,
    locked_versions: Vec<StudyMetadata>,
    deleted: bool,
    repository_closure_data: Option<RepositoryClosureData>,
}

/// Timestamp for a new version that never sorts before `previous`
fn fresh_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(previous)
}

impl StudyDefinition {
    /// Create a new study in DRAFT
    ///
    /// Every field group is checked against `ctx`. The study id prefix is
    /// derived from the project number; a supplied prefix is ignored.
    /// `uid_gen` is consulted once, after validation succeeds.
    ///
    /// # Errors
    /// `ValidationFailed` naming the first rejected field.
    pub fn create(
        fields: StudyFields,
        ctx: &dyn ValidationContext,
        uid_gen: &dyn UidGenerator,
    ) -> Result<Self> {
        validate_identification(&fields.identification, ctx)?;
        validate_high_level_study_design(&fields.high_level_study_design, ctx)?;
        validate_study_population(&fields.study_population, ctx)?;
        validate_study_intervention(&fields.study_intervention, ctx)?;

        let mut identification = fields.identification;
        identification.study_id_prefix = derive_prefix(&identification, ctx);

        let draft = StudyMetadata {
            identification,
            high_level_study_design: fields.high_level_study_design,
            study_population: fields.study_population,
            study_intervention: fields.study_intervention,
            study_description: fields.study_description,
            version: StudyVersionMetadata::draft(Utc::now()),
        };

        Ok(Self {
            uid: uid_gen.generate(),
            draft: Some(draft),
            released: None,
            locked_versions: Vec::new(),
            deleted: false,
            repository_closure_data: None,
        })
    }

    /// Apply a partial update to the draft
    ///
    /// Only groups present in `patch` and different from the draft are
    /// re-validated.
    ///
    /// The study number is fixed once it has a value: a patch supplying a
    /// different number is a business rule violation. A study created
    /// without a number may receive one here exactly once, since `lock`
    /// refuses a study without a number and a number-less study could
    /// otherwise never be locked. Once a locked version exists, prefix and
    /// number stay pinned to the current metadata whatever the patch says.
    ///
    /// # Errors
    /// - `NotInDraftState` unless the study is DRAFT
    /// - `NoDataToPatch` for an empty patch
    /// - `StudyNumberImmutable` when the number would change
    /// - `ValidationFailed` from the context checks
    pub fn edit(&mut self, patch: StudyMetadataPatch, ctx: &dyn ValidationContext) -> Result<()> {
        self.ensure_not_deleted()?;
        let current = self.require_draft("edit")?;
        if patch.is_empty() {
            return Err(StudyError::NoDataToPatch);
        }

        let mut next = current.clone();

        if let Some(mut identification) = patch.identification {
            let current_ident = &current.identification;
            if let (Some(existing), Some(requested)) =
                (&current_ident.study_number, &identification.study_number)
            {
                if existing != requested {
                    return Err(StudyError::StudyNumberImmutable {
                        current: existing.clone(),
                        requested: requested.clone(),
                    });
                }
            }
            if identification.study_number.is_none() {
                identification.study_number = current_ident.study_number.clone();
            }

            if self.locked_versions.is_empty() {
                identification.study_id_prefix = derive_prefix(&identification, ctx);
            } else {
                identification.study_id_prefix = current_ident.study_id_prefix.clone();
                identification.study_number = current_ident.study_number.clone();
            }

            if identification != *current_ident {
                validate_identification(&identification, ctx)?;
            }
            next.identification = identification;
        }

        if let Some(design) = patch.high_level_study_design {
            if design != current.high_level_study_design {
                validate_high_level_study_design(&design, ctx)?;
            }
            next.high_level_study_design = design;
        }
        if let Some(population) = patch.study_population {
            if population != current.study_population {
                validate_study_population(&population, ctx)?;
            }
            next.study_population = population;
        }
        if let Some(intervention) = patch.study_intervention {
            if intervention != current.study_intervention {
                validate_study_intervention(&intervention, ctx)?;
            }
            next.study_intervention = intervention;
        }
        if let Some(description) = patch.study_description {
            next.study_description = description;
        }

        next.version =
            StudyVersionMetadata::draft(fresh_timestamp(current.version.version_timestamp));
        self.draft = Some(next);
        Ok(())
    }

    /// Publish the current draft as the released copy
    ///
    /// The released copy keeps the draft's timestamp and the draft is
    /// re-stamped, so the draft is never older than the release. Status
    /// stays DRAFT. Releasing again replaces the previous released copy.
    ///
    /// # Errors
    /// `NotInDraftState` unless the study is DRAFT.
    pub fn release(&mut self, author: &str) -> Result<()> {
        self.ensure_not_deleted()?;
        let draft = self.require_draft("release")?;
        let stamp = draft.version.version_timestamp;

        let released =
            draft.with_version(StudyVersionMetadata::released(stamp, Some(author.to_string())));
        let restamped = draft.with_version(StudyVersionMetadata::draft(fresh_timestamp(stamp)));

        self.released = Some(released);
        self.draft = Some(restamped);
        Ok(())
    }

    /// Freeze the draft as the next locked version
    ///
    /// Returns the new locked version number (`count + 1`). Draft and
    /// released copies are cleared.
    ///
    /// # Errors
    /// - `NotInDraftState` unless the study is DRAFT
    /// - `MissingStudyIdentifier` if prefix or number is unset
    pub fn lock(&mut self, description: &str, author: &str) -> Result<u32> {
        self.ensure_not_deleted()?;
        let draft = self.require_draft("lock")?;

        let ident = &draft.identification;
        if ident.study_id_prefix.is_none() {
            return Err(StudyError::MissingStudyIdentifier {
                study_uid: self.uid.clone(),
                field: "study_id_prefix",
            });
        }
        if ident.study_number.is_none() {
            return Err(StudyError::MissingStudyIdentifier {
                study_uid: self.uid.clone(),
                field: "study_number",
            });
        }

        let number = self.locked_versions.len() as u32 + 1;
        let locked = draft.with_version(StudyVersionMetadata::locked(
            number,
            fresh_timestamp(draft.version.version_timestamp),
            Some(author.to_string()),
            Some(description.to_string()),
        ));

        self.locked_versions.push(locked);
        self.draft = None;
        self.released = None;
        Ok(number)
    }

    /// Open a new draft from the last locked version
    ///
    /// # Errors
    /// `NotLocked` unless the study is LOCKED.
    pub fn unlock(&mut self) -> Result<()> {
        self.ensure_not_deleted()?;
        if self.draft.is_some() {
            return Err(StudyError::NotLocked {
                study_uid: self.uid.clone(),
            });
        }
        let last = self.last_locked()?;
        let draft =
            last.with_version(StudyVersionMetadata::draft(fresh_timestamp(
                last.version.version_timestamp,
            )));
        self.draft = Some(draft);
        Ok(())
    }

    /// Soft-delete the study
    ///
    /// # Errors
    /// `DeleteWithLockedVersions` once any version has been locked.
    pub fn mark_deleted(&mut self) -> Result<()> {
        self.ensure_not_deleted()?;
        if !self.locked_versions.is_empty() {
            return Err(StudyError::DeleteWithLockedVersions {
                study_uid: self.uid.clone(),
                locked_count: self.locked_versions.len(),
            });
        }
        self.deleted = true;
        self.draft = None;
        self.released = None;
        Ok(())
    }

    // ===== Accessors =====

    /// Identity of the study; available even after deletion
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Draft if present, otherwise the last locked version
    pub fn current_metadata(&self) -> Result<&StudyMetadata> {
        self.ensure_not_deleted()?;
        match &self.draft {
            Some(draft) => Ok(draft),
            None => self.last_locked(),
        }
    }

    pub fn current_status(&self) -> Result<StudyStatus> {
        Ok(self.current_metadata()?.status())
    }

    pub fn released_metadata(&self) -> Result<Option<&StudyMetadata>> {
        self.ensure_not_deleted()?;
        Ok(self.released.as_ref())
    }

    pub fn latest_locked_metadata(&self) -> Result<Option<&StudyMetadata>> {
        self.ensure_not_deleted()?;
        Ok(self.locked_versions.last())
    }

    /// Released copy if one exists, otherwise the last locked version
    pub fn latest_released_or_locked(&self) -> Result<Option<&StudyMetadata>> {
        self.ensure_not_deleted()?;
        Ok(self.released.as_ref().or(self.locked_versions.last()))
    }

    /// Locked version `number`, 1-indexed
    ///
    /// # Errors
    /// `LockedVersionNotFound` outside `1..=locked_version_count`.
    pub fn get_specific_locked_version(&self, number: u32) -> Result<&StudyMetadata> {
        self.ensure_not_deleted()?;
        number
            .checked_sub(1)
            .and_then(|index| self.locked_versions.get(index as usize))
            .ok_or_else(|| StudyError::LockedVersionNotFound {
                study_uid: self.uid.clone(),
                version: number,
                available: self.locked_versions.len(),
            })
    }

    pub fn locked_versions(&self) -> Result<&[StudyMetadata]> {
        self.ensure_not_deleted()?;
        Ok(&self.locked_versions)
    }

    pub fn locked_version_count(&self) -> Result<usize> {
        self.ensure_not_deleted()?;
        Ok(self.locked_versions.len())
    }

    pub fn study_id(&self) -> Result<Option<String>> {
        Ok(self.current_metadata()?.study_id())
    }

    pub fn repository_closure_data(&self) -> Option<RepositoryClosureData> {
        self.repository_closure_data
    }

    pub fn set_repository_closure_data(&mut self, data: RepositoryClosureData) {
        self.repository_closure_data = Some(data);
    }

    // ===== Memento =====

    /// Durable form of the aggregate; works for deleted studies too
    pub fn to_snapshot(&self) -> StudyDefinitionSnapshot {
        let current = if self.deleted {
            None
        } else {
            self.draft
                .as_ref()
                .or(self.locked_versions.last())
                .map(StudyMetadataSnapshot::from)
        };
        let study_status = if self.draft.is_none() && !self.locked_versions.is_empty() {
            StudyStatus::Locked
        } else {
            StudyStatus::Draft
        };

        StudyDefinitionSnapshot {
            uid: self.uid.clone(),
            deleted: self.deleted,
            current,
            released: self.released.as_ref().map(StudyMetadataSnapshot::from),
            locked_metadata_versions: self
                .locked_versions
                .iter()
                .map(StudyMetadataSnapshot::from)
                .collect(),
            study_status,
        }
    }

    /// Rehydrate from the durable form
    ///
    /// Trusts field contents; only the structure is checked.
    ///
    /// # Errors
    /// `InconsistentSnapshot` when the structure is violated.
    pub fn from_snapshot(snapshot: StudyDefinitionSnapshot) -> Result<Self> {
        validate_study_snapshot(&snapshot)?;

        let draft = match snapshot.study_status {
            StudyStatus::Draft => snapshot.current.map(StudyMetadata::from),
            StudyStatus::Locked | StudyStatus::Released => None,
        };

        Ok(Self {
            uid: snapshot.uid,
            draft,
            released: snapshot.released.map(StudyMetadata::from),
            locked_versions: snapshot
                .locked_metadata_versions
                .into_iter()
                .map(StudyMetadata::from)
                .collect(),
            deleted: snapshot.deleted,
            repository_closure_data: None,
        })
    }

    // ===== Helpers =====

    fn ensure_not_deleted(&self) -> Result<()> {
        if self.deleted {
            return Err(StudyError::StudyDeleted {
                study_uid: self.uid.clone(),
            });
        }
        Ok(())
    }

    fn require_draft(&self, operation: &'static str) -> Result<&StudyMetadata> {
        self.draft
            .as_ref()
            .ok_or_else(|| StudyError::NotInDraftState {
                study_uid: self.uid.clone(),
                operation,
            })
    }

    fn last_locked(&self) -> Result<&StudyMetadata> {
        self.locked_versions
            .last()
            .ok_or_else(|| StudyError::Internal {
                message: format!("study {} has neither draft nor locked versions", self.uid),
            })
    }
}

fn derive_prefix(
    identification: &StudyIdentificationMetadata,
    ctx: &dyn ValidationContext,
) -> Option<String> {
    identification
        .project_number
        .as_deref()
        .and_then(|project| ctx.study_id_prefix_for(project))
}
