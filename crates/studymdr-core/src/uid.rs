//! Study uid generation

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of new study uids; called exactly once per created study
pub trait UidGenerator {
    fn generate(&self) -> String;
}

impl<F> UidGenerator for F
where
    F: Fn() -> String,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Time-ordered UUIDv7 strings
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7UidGenerator;

impl UidGenerator for UuidV7UidGenerator {
    fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Sequential `Study_000001` style uids
///
/// The store seeds `next` from the highest persisted uid.
#[derive(Debug, Default)]
pub struct StudyUidGenerator {
    last: AtomicU64,
}

impl StudyUidGenerator {
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    pub fn format(n: u64) -> String {
        format!("Study_{:06}", n)
    }

    /// Numeric part of a uid produced by this generator
    pub fn parse(uid: &str) -> Option<u64> {
        uid.strip_prefix("Study_")?.parse().ok()
    }
}

impl UidGenerator for StudyUidGenerator {
    fn generate(&self) -> String {
        Self::format(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_uids() {
        let generator = StudyUidGenerator::starting_after(41);
        assert_eq!(generator.generate(), "Study_000042");
        assert_eq!(generator.generate(), "Study_000043");
        assert_eq!(StudyUidGenerator::parse("Study_000043"), Some(43));
        assert_eq!(StudyUidGenerator::parse("Epoch_000001"), None);
    }

    #[test]
    fn test_closure_generator() {
        let generator = || "fixed".to_string();
        assert_eq!(UidGenerator::generate(&generator), "fixed");
    }

    #[test]
    fn test_uuid_v7_generator_unique() {
        let generator = UuidV7UidGenerator;
        assert_ne!(generator.generate(), generator.generate());
    }
}
