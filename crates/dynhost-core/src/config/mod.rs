//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate, overlaid with `DYNHOST__*` environment variables.

pub mod logging;
pub mod units;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::units::UnitConfig;

use crate::error::{AppError, AppResult};

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "DYNHOST";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Module loading settings.
    #[serde(default = "units::default_modules")]
    pub modules: UnitConfig,
    /// Plugin loading settings.
    #[serde(default = "units::default_plugins")]
    pub plugins: UnitConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            modules: units::default_modules(),
            plugins: units::default_plugins(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with the `config/{env}.toml` overlay and
    /// environment variables prefixed with `DYNHOST__`. Missing files are
    /// not an error; every field has a default.
    pub fn load(env: &str) -> AppResult<Self> {
        tracing::debug!(env, "Loading configuration");
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        Self::build(builder)
    }

    /// Load configuration from one explicit file plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "Config file '{}' does not exist",
                path.display()
            )));
        }
        tracing::debug!(path = %path.display(), "Loading configuration file");
        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::build(builder)
    }

    /// Check field values the schema alone cannot.
    pub fn validate(&self) -> AppResult<()> {
        self.modules.validate("modules")?;
        self.plugins.validate("plugins")?;
        self.logging.validate()
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> AppResult<Self> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
