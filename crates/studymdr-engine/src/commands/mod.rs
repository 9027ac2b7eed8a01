//! Command orchestration layer.
//!
//! Functions here load aggregates and documents through `studymdr-store`,
//! run the pure domain operations from `studymdr-core` and persist the
//! result, with operation-boundary logging around each call.

pub mod engine_command;
pub mod flowchart;
pub mod study;

use std::time::Instant;
use studymdr_core::errors::ExError;
use studymdr_core_types::RequestContext;
use studymdr_store::Result;

/// Run `f` between a start event and an end / end_error event
///
/// Errors leave with the request's correlation ids attached.
pub(crate) fn logged<T>(
    op: &'static str,
    study_uid: &str,
    req: &RequestContext,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let start = Instant::now();
    let request_id = req.request_id.as_str();
    studymdr_core::log_op_start!(op, study_uid = study_uid, request_id = request_id);

    let result = f().map_err(|e| correlate(e, req));
    let duration_ms = start.elapsed().as_millis() as u64;

    match &result {
        Ok(_) => {
            studymdr_core::log_op_end!(
                op,
                duration_ms = duration_ms,
                study_uid = study_uid,
                request_id = request_id
            );
        }
        Err(err) => {
            studymdr_core::log_op_error!(
                op,
                err,
                duration_ms = duration_ms,
                study_uid = study_uid,
                request_id = request_id
            );
        }
    }
    result
}

fn correlate(err: ExError, req: &RequestContext) -> ExError {
    let err = err.with_request_id(req.request_id.clone());
    match &req.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
