//! OS loader backed by `libloading`.
//!
//! Windows goes through `LoadLibraryExW` / `GetProcAddress` / `FreeLibrary`,
//! POSIX through `dlopen(RTLD_LAZY)` / `dlsym` / `dlclose`.

use std::path::Path;

use libloading::Library;
use tracing::{debug, warn};

use super::{DynamicLinker, LinkError};
use crate::ffi::RawSymbol;

/// The real dynamic linker of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl DynamicLinker for SystemLinker {
    type Handle = Library;

    fn open(&self, name: &str) -> Result<Library, LinkError> {
        // SAFETY: mapping a library runs its initialisers. Callers only pass
        // libraries they trust to be units.
        unsafe { open_native(name) }.map_err(|e| LinkError::new(name, e.to_string()))
    }

    fn resolve(&self, handle: &Library, symbol: &str) -> Option<RawSymbol> {
        // SAFETY: the symbol is only read as an address here; the caller
        // decides the signature from the symbol name.
        let sym = unsafe { handle.get::<unsafe extern "C-unwind" fn()>(symbol.as_bytes()) }.ok()?;
        RawSymbol::new(*sym as *const std::ffi::c_void)
    }

    fn close(&self, handle: Library) {
        if let Err(e) = handle.close() {
            warn!(error = %e, "Closing library reported an error");
        }
    }

    /// Resolves names of existing files to their canonical path. Bare
    /// names are left for the OS search path.
    fn canonical_name(&self, name: &str) -> String {
        let path = Path::new(name);
        if !path.is_file() {
            return name.to_string();
        }
        match std::fs::canonicalize(path) {
            Ok(canonical) => canonical.to_string_lossy().into_owned(),
            Err(e) => {
                debug!(library = %name, error = %e, "Could not canonicalise library path");
                name.to_string()
            }
        }
    }
}

#[cfg(unix)]
unsafe fn open_native(name: &str) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_LAZY};

    unsafe { UnixLibrary::open(Some(name), RTLD_LAZY) }.map(Library::from)
}

#[cfg(windows)]
unsafe fn open_native(name: &str) -> Result<Library, libloading::Error> {
    use libloading::os::windows::Library as WindowsLibrary;

    unsafe { WindowsLibrary::new(name) }.map(Library::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A library every test host already has mapped, and one of its exports.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    const SYSTEM_LIBRARY: (&str, &str) = ("libc.so.6", "getpid");
    #[cfg(target_os = "macos")]
    const SYSTEM_LIBRARY: (&str, &str) = ("/usr/lib/libSystem.B.dylib", "getpid");
    #[cfg(windows)]
    const SYSTEM_LIBRARY: (&str, &str) = ("kernel32.dll", "GetCurrentProcessId");

    #[test]
    fn test_open_missing_library_fails() {
        let linker = SystemLinker;
        let err = linker
            .open("/nonexistent/dir/libdoes_not_exist_4f1c.so")
            .unwrap_err();
        assert_eq!(err.name, "/nonexistent/dir/libdoes_not_exist_4f1c.so");
        assert!(!err.reason.is_empty());
    }

    #[cfg(any(all(target_os = "linux", target_env = "gnu"), target_os = "macos", windows))]
    #[test]
    fn test_open_resolve_close_system_library() {
        let (name, symbol) = SYSTEM_LIBRARY;
        let linker = SystemLinker;

        let handle = linker.open(name).unwrap();
        assert!(linker.resolve(&handle, symbol).is_some());
        assert!(linker.resolve(&handle, "dynhost_no_such_export").is_none());
        linker.close(handle);
    }

    #[cfg(any(all(target_os = "linux", target_env = "gnu"), target_os = "macos", windows))]
    #[test]
    fn test_manager_over_system_library_without_factory() {
        use std::sync::Arc;

        use crate::error::UnitError;
        use crate::manager::{ModuleManager, UnitManager};
        use crate::registry::InterfaceRegistry;

        let (name, _) = SYSTEM_LIBRARY;
        let registry = Arc::new(InterfaceRegistry::new());
        let manager: ModuleManager =
            UnitManager::with_linker(SystemLinker, Arc::clone(&registry));

        let err = manager.load(name).unwrap_err();
        assert!(matches!(err, UnitError::MissingSymbol { symbol: "CreateModule", .. }));
        assert!(manager.is_empty());
        assert!(!manager.is_loaded());
        assert_eq!(registry.get_errors().len(), 1);
    }

    #[test]
    fn test_canonical_name_resolves_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("libunit.so");
        std::fs::write(&file, b"").unwrap();

        let linker = SystemLinker;
        let dotted = dir.path().join(".").join("libunit.so");
        let expected = std::fs::canonicalize(&file).unwrap();
        assert_eq!(
            linker.canonical_name(&dotted.to_string_lossy()),
            expected.to_string_lossy()
        );
        assert_eq!(
            linker.canonical_name(&file.to_string_lossy()),
            expected.to_string_lossy()
        );
        assert_eq!(linker.canonical_name("libc.so.6"), "libc.so.6");
    }
}
