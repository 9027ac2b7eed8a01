//! Subscriber installation

use std::str::FromStr;
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, `studymdr=debug`
    Development,
    /// JSON lines, `studymdr=info`
    Production,
    /// Bare registry; tests install their own layer via `init_test_capture`
    Test,
}

impl Profile {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "studymdr=debug",
            Profile::Production => "studymdr=info",
            Profile::Test => "off",
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown logging profile '{}'", other)),
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber for `profile`
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default directive.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let filter = || {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(profile.default_directive()))
        };
        // try_init: a host process may already own the global subscriber
        match profile {
            Profile::Development => {
                let _ = tracing_subscriber::fmt().with_env_filter(filter()).try_init();
            }
            Profile::Production => {
                let _ = tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter())
                    .try_init();
            }
            Profile::Test => {
                let _ = tracing_subscriber::registry().try_init();
            }
        }
    });
}
