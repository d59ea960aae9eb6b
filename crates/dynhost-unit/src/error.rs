//! Loader error types.

use thiserror::Error;

use dynhost_core::error::{AppError, ErrorKind};

/// Errors produced while loading, running or unloading a unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The OS loader could not map the library.
    #[error("could not load library '{name}': {reason}")]
    LibraryOpen {
        /// Load key passed to `load`.
        name: String,
        /// Loader diagnostic.
        reason: String,
    },

    /// A required export is absent from an otherwise valid library.
    #[error("library '{name}' does not export '{symbol}'")]
    MissingSymbol {
        /// Load key passed to `load`.
        name: String,
        /// Name of the missing symbol.
        symbol: &'static str,
    },

    /// The factory ran but declined to produce an instance.
    #[error("'{symbol}' in '{name}' returned a null instance")]
    FactoryReturnedNull {
        /// Load key passed to `load`.
        name: String,
        /// Factory symbol name.
        symbol: &'static str,
    },

    /// The factory (or a metadata getter) unwound while building the unit.
    #[error("'{symbol}' in '{name}' panicked: {message}")]
    FactoryPanicked {
        /// Load key passed to `load`.
        name: String,
        /// Factory symbol name.
        symbol: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The unit behind a handle has already been unloaded.
    #[error("unit '{name}' has been unloaded")]
    Unloaded {
        /// Load key of the unit.
        name: String,
    },

    /// The unit's `run` reported a failure.
    #[error("unit '{name}' failed: {message}")]
    Run {
        /// Load key of the unit.
        name: String,
        /// Message returned by the unit.
        message: String,
    },
}

impl UnitError {
    /// Load key of the library this error concerns.
    pub fn library(&self) -> &str {
        match self {
            Self::LibraryOpen { name, .. }
            | Self::MissingSymbol { name, .. }
            | Self::FactoryReturnedNull { name, .. }
            | Self::FactoryPanicked { name, .. }
            | Self::Unloaded { name }
            | Self::Run { name, .. } => name,
        }
    }
}

impl From<UnitError> for AppError {
    fn from(err: UnitError) -> Self {
        let kind = match &err {
            UnitError::LibraryOpen { .. } => ErrorKind::Library,
            UnitError::MissingSymbol { .. } => ErrorKind::Symbol,
            UnitError::FactoryReturnedNull { .. } | UnitError::FactoryPanicked { .. } => {
                ErrorKind::Factory
            }
            UnitError::Unloaded { .. } => ErrorKind::NotFound,
            UnitError::Run { .. } => ErrorKind::Internal,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_app_error_kind() {
        let err = UnitError::MissingSymbol {
            name: "libx.so".to_string(),
            symbol: "CreateModule",
        };
        let app: AppError = err.into();
        assert_eq!(app.kind, ErrorKind::Symbol);
        assert!(app.message.contains("CreateModule"));
    }

    #[test]
    fn test_library_accessor() {
        let err = UnitError::Unloaded {
            name: "libz".to_string(),
        };
        assert_eq!(err.library(), "libz");
    }
}
