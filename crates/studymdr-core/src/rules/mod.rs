pub mod context;
pub mod invariants;
pub mod validation;

pub use context::{
    CodelistValidationContext, PermissiveValidationContext, TermCategory, ValidationContext,
};
