//! Core types shared across the studymdr facilities
//!
//! This crate provides foundational types used by both the error
//! facility and the logging facility:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
