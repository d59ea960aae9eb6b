//! Platform dynamic-link shim.
//!
//! [`DynamicLinker`] is the only place the loader touches the OS loader.
//! [`SystemLinker`] talks to the real one; `MockLinker` (feature `mock`)
//! serves in-memory libraries for tests.

#[cfg(feature = "mock")]
pub mod mock;
pub mod system;

use thiserror::Error;

use crate::ffi::RawSymbol;

#[cfg(feature = "mock")]
pub use mock::{MockLibrary, MockLinker};
pub use system::SystemLinker;

/// Failure reported by [`DynamicLinker::open`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to open '{name}': {reason}")]
pub struct LinkError {
    /// Name or path that was requested.
    pub name: String,
    /// Loader diagnostic.
    pub reason: String,
}

impl LinkError {
    /// Creates a link error.
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Open / resolve / close over one OS loader.
///
/// `open` either yields a live handle or an error, `resolve` yields a
/// non-null address or `None`, and `close` never fails from the caller's
/// point of view. A closed handle is consumed and cannot be reused.
pub trait DynamicLinker: Send + Sync {
    /// Opaque library handle.
    type Handle: Send;

    /// Maps the named library. `name` follows the OS loader's own rules
    /// for paths, suffixes and search directories.
    fn open(&self, name: &str) -> Result<Self::Handle, LinkError>;

    /// Looks up an exported symbol.
    fn resolve(&self, handle: &Self::Handle, symbol: &str) -> Option<RawSymbol>;

    /// Releases the library.
    fn close(&self, handle: Self::Handle);

    /// The key a manager files `name` under. Names that reach the same
    /// library should map to the same key.
    fn canonical_name(&self, name: &str) -> String {
        name.to_string()
    }
}
