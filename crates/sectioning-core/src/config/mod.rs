//! Engine configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so partial files load.

pub mod catalog;
pub mod deadline;
pub mod logging;
pub mod notification;
pub mod policy;
pub mod search;
pub mod waitlist;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::catalog::CatalogConfig;
pub use self::deadline::{DeadlineConfig, DeadlineWindow};
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationsConfig;
pub use self::policy::PolicyConfig;
pub use self::search::{QueueOrder, SearchConfig, StabilityWeights, WeightingMode};
pub use self::waitlist::{WaitListConfig, WaitListMode};
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Enrollment policy switches.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// New/change/drop deadline windows.
    #[serde(default)]
    pub deadlines: DeadlineConfig,
    /// Wait-list eligibility by student status.
    #[serde(default)]
    pub waitlist: WaitListConfig,
    /// Resectioning search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Background recheck worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Catalog fixture locations.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SECTIONING__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SECTIONING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
