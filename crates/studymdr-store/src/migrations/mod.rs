//! Migration framework
//!
//! Embedded SQL applied in order, each in its own transaction, recorded in
//! `schema_version` with a checksum. Re-running is a no-op; an edited
//! migration is rejected.

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
