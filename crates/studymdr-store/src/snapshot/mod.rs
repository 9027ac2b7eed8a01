//! SoA snapshot persistence
//!
//! ## Responsibilities
//!
//! - Replace the references of one `(study, version, layout)` atomically
//! - Keep an existence row with digest and counts per snapshot
//! - Maintain head pointers for version-less loads
//!
//! ## Non-Responsibilities
//!
//! - Building tables and references (handled by `studymdr-core`)
//! - Deciding when to snapshot (handled by `studymdr-engine`)

pub mod persist;
pub mod query;

pub use persist::{disconnect_heads, disconnect_soa_snapshot, save_soa_snapshot, set_head};
pub use query::{
    fetch_snapshot_row, head_version, list_snapshot_rows, load_soa_snapshot, snapshot_exists,
    SoASnapshotRow,
};
