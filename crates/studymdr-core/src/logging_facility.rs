//! Structured logging for the study repository
//!
//! One initialization point (`init`), three operation-boundary macros
//! (`log_op_start!`, `log_op_end!`, `log_op_error!`) that emit the canonical
//! `component` / `op` / `event` fields, and an in-memory capture layer for
//! tests that assert on emitted events.
//!
//! ```rust
//! use studymdr_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
