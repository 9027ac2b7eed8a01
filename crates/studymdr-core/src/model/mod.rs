pub mod memento;
pub mod metadata;
pub mod study_definition;

pub use memento::{StudyDefinitionSnapshot, StudyMetadataSnapshot};
pub use metadata::{
    HighLevelStudyDesign, NullableValue, RegistryIdentifiers, StudyDescription, StudyFields,
    StudyIdentificationMetadata, StudyIntervention, StudyMetadata, StudyMetadataPatch,
    StudyPopulation, StudyStatus, StudyVersionMetadata,
};
pub use study_definition::{RepositoryClosureData, StudyDefinition};
