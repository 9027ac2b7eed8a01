use studymdr_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using StudyError
pub type Result<T> = std::result::Result<T, StudyError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers outside the core
/// (service layer, API adapters) translate into client-facing statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Aggregate business rules
    IllegalState,
    Validation,
    BusinessRule,
    NotFound,
    InvalidArgument,

    // Memento / wire format
    InvalidSnapshot,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::IllegalState => "ERR_ILLEGAL_STATE",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::BusinessRule => "ERR_BUSINESS_RULE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus whatever context the failing layer
/// knows: the operation, the study uid, the offending field and value
/// for validation failures, the study version for version lookups.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    field: Option<String>,
    value: Option<String>,
    version: Option<u32>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            field: None,
            value: None,
            version: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (study uid, item uid)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add the name of the field that failed validation
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add the offending value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Add study version context
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(version) = self.version {
            write!(f, " (version: {})", version)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for the study aggregate and the SoA engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudyError {
    // ===== Illegal state transitions =====
    /// Edit/release/lock attempted outside DRAFT
    #[error("Study {study_uid} is not in DRAFT state: {operation} not allowed")]
    NotInDraftState {
        study_uid: String,
        operation: &'static str,
    },

    /// Unlock attempted outside LOCKED
    #[error("Study {study_uid} is not in LOCKED state: unlock not allowed")]
    NotLocked { study_uid: String },

    /// Any operation on a soft-deleted study
    #[error("no operations allowed on deleted study {study_uid}")]
    StudyDeleted { study_uid: String },

    /// Delete attempted after the first lock
    #[error("cannot delete a StudyDefinition having locked versions (study {study_uid} has {locked_count})")]
    DeleteWithLockedVersions {
        study_uid: String,
        locked_count: usize,
    },

    /// Lock attempted without study_id_prefix or study_number
    #[error("Cannot lock study {study_uid}: {field} is not set")]
    MissingStudyIdentifier {
        study_uid: String,
        field: &'static str,
    },

    // ===== Validation =====
    /// An external existence check rejected a supplied value
    #[error("Validation failed for field '{field}': value '{value}' does not exist")]
    ValidationFailed { field: String, value: String },

    /// Caller supplied no field groups to edit
    #[error("no data to patch")]
    NoDataToPatch,

    /// Malformed caller input
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // ===== Business rules =====
    /// Study number cannot change after creation
    #[error("Study number cannot be changed from '{current}' to '{requested}'")]
    StudyNumberImmutable { current: String, requested: String },

    // ===== Lookups =====
    /// Locked version number outside 1..=count
    #[error("Study {study_uid} has no locked version {version} ({available} available)")]
    LockedVersionNotFound {
        study_uid: String,
        version: u32,
        available: usize,
    },

    /// A selection referenced from the design does not exist
    #[error("{item_type} {item_uid} not found")]
    ItemNotFound { item_type: String, item_uid: String },

    /// A footnote points at an item that is not part of the design
    #[error("Footnote {footnote_uid} references unknown {item_type} {item_uid}")]
    FootnoteTargetNotFound {
        footnote_uid: String,
        item_type: String,
        item_uid: String,
    },

    // ===== Memento =====
    /// Rehydration found a structurally inconsistent snapshot
    #[error("Inconsistent study snapshot for {study_uid}: {reason}")]
    InconsistentSnapshot { study_uid: String, reason: String },

    // ===== Generic =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StudyError {
    /// Classification of this error in the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            StudyError::NotInDraftState { .. }
            | StudyError::NotLocked { .. }
            | StudyError::StudyDeleted { .. }
            | StudyError::DeleteWithLockedVersions { .. }
            | StudyError::MissingStudyIdentifier { .. } => ExErrorKind::IllegalState,
            StudyError::ValidationFailed { .. } => ExErrorKind::Validation,
            StudyError::NoDataToPatch | StudyError::InvalidArgument { .. } => {
                ExErrorKind::InvalidArgument
            }
            StudyError::StudyNumberImmutable { .. } => ExErrorKind::BusinessRule,
            StudyError::LockedVersionNotFound { .. }
            | StudyError::ItemNotFound { .. }
            | StudyError::FootnoteTargetNotFound { .. } => ExErrorKind::NotFound,
            StudyError::InconsistentSnapshot { .. } => ExErrorKind::InvalidSnapshot,
            StudyError::Serialization { .. } => ExErrorKind::Serialization,
            StudyError::Internal { .. } => ExErrorKind::Internal,
        }
    }
}

/// Conversion from StudyError to the canonical ExError
///
/// The domain message is kept verbatim; structured context (uid, field,
/// value, version) is lifted into the dedicated ExError slots.
impl From<StudyError> for ExError {
    fn from(err: StudyError) -> Self {
        let base = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            StudyError::NotInDraftState { study_uid, .. }
            | StudyError::NotLocked { study_uid }
            | StudyError::StudyDeleted { study_uid }
            | StudyError::DeleteWithLockedVersions { study_uid, .. }
            | StudyError::InconsistentSnapshot { study_uid, .. } => {
                base.with_entity_id(study_uid)
            }
            StudyError::MissingStudyIdentifier { study_uid, field } => {
                base.with_entity_id(study_uid).with_field(field)
            }
            StudyError::ValidationFailed { field, value } => {
                base.with_field(field).with_value(value)
            }
            StudyError::StudyNumberImmutable { current, requested } => base
                .with_field("study_number")
                .with_value(requested)
                .with_message(format!(
                    "Study number cannot be changed from '{}'",
                    current
                )),
            StudyError::LockedVersionNotFound {
                study_uid, version, ..
            } => base.with_entity_id(study_uid).with_version(version),
            StudyError::ItemNotFound { item_uid, .. }
            | StudyError::FootnoteTargetNotFound { item_uid, .. } => {
                base.with_entity_id(item_uid)
            }
            StudyError::NoDataToPatch
            | StudyError::InvalidArgument { .. }
            | StudyError::Serialization { .. }
            | StudyError::Internal { .. } => base,
        }
    }
}

impl From<serde_json::Error> for StudyError {
    fn from(err: serde_json::Error) -> Self {
        StudyError::Serialization {
            message: err.to_string(),
        }
    }
}
