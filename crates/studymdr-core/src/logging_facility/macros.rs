//! Operation-boundary logging macros
//!
//! Every engine operation logs exactly one `start` and one of `end` /
//! `end_error`. Extra fields are passed through to `tracing`.

/// Log the start of an operation
///
/// ```
/// # use studymdr_core::log_op_start;
/// log_op_start!("lock_study");
/// log_op_start!("lock_study", study_uid = "Study_000001");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = studymdr_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = studymdr_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use studymdr_core::log_op_end;
/// log_op_end!("lock_study", duration_ms = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = studymdr_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = studymdr_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log a failed operation
///
/// `$err` is anything convertible into `ExError`; it is cloned so the
/// caller can still return it.
///
/// ```
/// # use studymdr_core::log_op_error;
/// # use studymdr_core::errors::StudyError;
/// let err = StudyError::NoDataToPatch;
/// log_op_error!("edit_study", &err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone($err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = studymdr_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone($err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = studymdr_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            message = ex_err.message(),
            $($field)*
        );
    }};
}
