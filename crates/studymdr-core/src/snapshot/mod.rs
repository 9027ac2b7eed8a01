//! Frozen SoA snapshots
//!
//! A snapshot is the list of cell references plus the footnote list of one
//! rendered layout. It is written when a study version is locked and read
//! back for historical tables.
//!
//! Persistence lives in `studymdr-store`; orchestration in `studymdr-engine`.

pub mod digest;
pub mod rebuild;
pub mod references;

pub use digest::compute_snapshot_digest;
pub use rebuild::rebuild_table;
pub use references::{ReferencedItem, SoACellReference, SoAFootnoteReference, SoASnapshot};
