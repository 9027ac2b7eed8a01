//! Error handling for studymdr-store
//!
//! Store functions return the canonical `ExError`; these helpers attach the
//! kind and operation context for the common failure modes.

use studymdr_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Like `from_rusqlite`, but constraint violations become `Concurrency`
///
/// Used on inserts whose primary key is the only guard against two writers
/// appending the same locked version.
pub fn from_rusqlite_insert(op: &str, entity_id: &str, err: rusqlite::Error) -> ExError {
    let constraint = matches!(
        &err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation
    );
    if constraint {
        concurrency_conflict(
            op,
            entity_id,
            &format!("concurrent write detected: {}", err),
        )
    } else {
        from_rusqlite(err).with_op(op).with_entity_id(entity_id)
    }
}

/// Create a JSON (de)serialization error
pub fn serialization_error(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op)
        .with_message(err.to_string())
}

/// Create an optimistic-concurrency error
pub fn concurrency_conflict(op: &str, entity_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Concurrency)
        .with_op(op)
        .with_entity_id(entity_id)
        .with_message(reason.to_string())
}
