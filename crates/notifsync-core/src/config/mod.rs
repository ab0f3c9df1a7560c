//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from an
//! optional TOML file layered under `NOTIFSYNC_`-prefixed environment
//! variables. Every section has defaults, so an empty source is valid.

pub mod api;
pub mod logging;
pub mod scheduler;
pub mod session;
pub mod sync;

use serde::{Deserialize, Serialize};

pub use self::api::ApiConfig;
pub use self::logging::LoggingConfig;
pub use self::scheduler::SchedulerConfig;
pub use self::session::SessionConfig;
pub use self::sync::SyncConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote notification feed settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Current session (user and bearer token).
    #[serde(default)]
    pub session: SessionConfig,
    /// Polling and reconciliation settings.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Local notification scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file (extension optional, may be
    /// missing) and environment variables prefixed with `NOTIFSYNC_`.
    ///
    /// Nested keys use `__`, e.g. `NOTIFSYNC_SYNC__POLL_INTERVAL_SECONDS=3`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(environment())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("NOTIFSYNC")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
