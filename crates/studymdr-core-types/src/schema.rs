//! Canonical schema constants for structured logging and events
//!
//! These constants keep log field names identical across the core,
//! store and engine crates.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_STUDY_UID: &str = "study_uid";
pub const FIELD_STUDY_VERSION: &str = "study_version";
pub const FIELD_SOA_LAYOUT: &str = "soa_layout";

// Collection sizes
pub const FIELD_CELL_REF_COUNT: &str = "cell_ref_count";
pub const FIELD_FOOTNOTE_REF_COUNT: &str = "footnote_ref_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
