//! Logging configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Accepted values of [`LoggingConfig::level`].
pub const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Accepted values of [`LoggingConfig::format`].
pub const FORMATS: &[&str] = &["pretty", "json"];

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log format: `"json"` or `"pretty"`.
    #[serde(default = "default_format")]
    pub format: String,
    /// Include thread ids in every event.
    #[serde(default)]
    pub thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Whether events should be written as JSON lines.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    /// Rejects unknown levels and formats.
    pub fn validate(&self) -> Result<(), AppError> {
        let level = self.level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(AppError::validation(format!(
                "logging.level '{}' is not one of {}",
                self.level,
                LEVELS.join(", ")
            )));
        }
        let format = self.format.to_ascii_lowercase();
        if !FORMATS.contains(&format.as_str()) {
            return Err(AppError::validation(format!(
                "logging.format '{}' is not one of {}",
                self.format,
                FORMATS.join(", ")
            )));
        }
        Ok(())
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}
