//! Engine runtime configuration.
//!
//! Resolved once at startup and passed to whoever opens the store, so
//! request handling never reads process-wide environment variables.

#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use studymdr_core::errors::{ExError, ExErrorKind};
use studymdr_core::flowchart::{FlowchartOptions, SoALayout, TimeUnit};
use studymdr_core::logging_facility::Profile;
use studymdr_store::Result;

pub const ENV_DB_PATH: &str = "STUDYMDR_DB_PATH";
pub const ENV_LOG_PROFILE: &str = "STUDYMDR_LOG_PROFILE";
pub const ENV_SOA_LAYOUT: &str = "STUDYMDR_SOA_LAYOUT";
pub const ENV_TIME_UNIT: &str = "STUDYMDR_TIME_UNIT";

pub const DEFAULT_DB_PATH: &str = "studymdr.db";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    db_path: PathBuf,
    log_profile: Profile,
    soa_layout: SoALayout,
    /// `None` keeps each design's preferred unit
    time_unit: Option<TimeUnit>,
}

impl EngineConfig {
    /// Defaults: development logging, protocol layout
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            log_profile: Profile::Development,
            soa_layout: SoALayout::Protocol,
            time_unit: None,
        }
    }

    /// Read the `STUDYMDR_*` variables, after loading `.env` if present
    ///
    /// # Errors
    /// `InvalidArgument` naming the variable that does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_values(
            std::env::var(ENV_DB_PATH).ok(),
            std::env::var(ENV_LOG_PROFILE).ok(),
            std::env::var(ENV_SOA_LAYOUT).ok(),
            std::env::var(ENV_TIME_UNIT).ok(),
        )
    }

    /// Build from raw values; unset or blank values take the defaults
    ///
    /// # Errors
    /// `InvalidArgument` naming the variable that does not parse.
    pub fn from_env_values(
        db_path: Option<String>,
        log_profile: Option<String>,
        soa_layout: Option<String>,
        time_unit: Option<String>,
    ) -> Result<Self> {
        let db_path = non_blank(db_path).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let mut config = Self::new(db_path);

        if let Some(value) = non_blank(log_profile) {
            config.log_profile = value
                .parse()
                .map_err(|reason: String| invalid(ENV_LOG_PROFILE, &value, reason))?;
        }
        if let Some(value) = non_blank(soa_layout) {
            config.soa_layout = value
                .parse()
                .map_err(|e: studymdr_core::StudyError| invalid(ENV_SOA_LAYOUT, &value, e.to_string()))?;
        }
        if let Some(value) = non_blank(time_unit) {
            let unit = value
                .parse()
                .map_err(|e: studymdr_core::StudyError| invalid(ENV_TIME_UNIT, &value, e.to_string()))?;
            config.time_unit = Some(unit);
        }

        Ok(config)
    }

    pub fn with_log_profile(mut self, profile: Profile) -> Self {
        self.log_profile = profile;
        self
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = Some(time_unit);
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn log_profile(&self) -> Profile {
        self.log_profile
    }

    pub fn soa_layout(&self) -> SoALayout {
        self.soa_layout
    }

    pub fn time_unit(&self) -> Option<TimeUnit> {
        self.time_unit
    }

    /// Flowchart options for the configured layout and unit
    pub fn flowchart_options(&self) -> FlowchartOptions {
        FlowchartOptions {
            time_unit: self.time_unit,
            ..FlowchartOptions::for_layout(self.soa_layout)
        }
    }

    /// Open the configured database and bring its schema up to date
    ///
    /// # Errors
    /// `Persistence` if the file cannot be opened or migrated.
    pub fn open_store(&self) -> Result<Connection> {
        studymdr_store::db::open_store(&self.db_path)
    }

    /// Install the global subscriber for the configured profile
    pub fn init_logging(&self) {
        studymdr_core::logging_facility::init(self.log_profile);
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(variable: &str, value: &str, reason: String) -> ExError {
    ExError::new(ExErrorKind::InvalidArgument)
        .with_op("load_config")
        .with_field(variable)
        .with_value(value)
        .with_message(reason)
}
