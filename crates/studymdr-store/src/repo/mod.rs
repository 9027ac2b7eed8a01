//! Repositories bridging the domain model and SQLite

pub mod design_repo;
pub mod study_repo;
pub mod terms;

pub use design_repo::SqliteDesignRepo;
pub use study_repo::SqliteStudyRepo;
pub use terms::{load_term_labels, upsert_term};
