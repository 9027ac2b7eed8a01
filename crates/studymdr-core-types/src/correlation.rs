//! Correlation types for request tracking
//!
//! A `RequestContext` travels with every engine operation so that log
//! events and errors emitted while locking a study or building a
//! schedule of activities can be tied back to the caller's request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh time-ordered identifier (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Get the string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Wrap an identifier received from an upstream caller
            pub fn from_string(s: String) -> Self {
                Self(s)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifier of a single engine request (one transaction)
    RequestId
);

correlation_id!(
    /// Identifier shared by every request belonging to one client interaction
    TraceId
);

/// Context carried through operation boundaries
///
/// `author` is the user on whose behalf the request runs; it ends up in
/// the version metadata of released and locked study versions.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
    pub author: Option<String>,
}

impl RequestContext {
    /// Create a new context with a fresh RequestId and no author
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context acting on behalf of `author`
    pub fn for_author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            ..Self::default()
        }
    }

    /// Add a TraceId to the context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Author name, or `"unknown-user"` when the request is anonymous
    pub fn author_or_unknown(&self) -> &str {
        self.author.as_deref().unwrap_or("unknown-user")
    }
}
