//! Unit loading configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Settings for one unit kind (modules or plugins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Directory scanned for shared libraries of this kind.
    pub directory: String,
    /// Whether every library found in `directory` is loaded on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Library names or paths loaded on startup regardless of `auto_load`.
    #[serde(default)]
    pub autoload: Vec<String>,
    /// Whether the host calls `run` on each unit right after loading it.
    #[serde(default = "default_true")]
    pub run_on_load: bool,
}

impl UnitConfig {
    /// Default settings rooted at the given directory.
    pub fn with_directory(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            auto_load: true,
            autoload: Vec::new(),
            run_on_load: true,
        }
    }

    /// Rejects an empty directory or blank autoload entries. `section`
    /// names the table in error messages.
    pub fn validate(&self, section: &str) -> Result<(), AppError> {
        if self.directory.trim().is_empty() {
            return Err(AppError::validation(format!(
                "{section}.directory must not be empty"
            )));
        }
        if let Some(index) = self.autoload.iter().position(|n| n.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "{section}.autoload[{index}] is blank"
            )));
        }
        Ok(())
    }
}

pub(crate) fn default_modules() -> UnitConfig {
    UnitConfig::with_directory("./modules")
}

pub(crate) fn default_plugins() -> UnitConfig {
    UnitConfig::with_directory("./plugins")
}

fn default_true() -> bool {
    true
}
