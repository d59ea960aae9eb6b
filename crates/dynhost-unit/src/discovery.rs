//! Finding unit libraries on disk.

use std::env::consts::{DLL_EXTENSION, DLL_PREFIX, DLL_SUFFIX};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Whether `path` carries this platform's shared-library extension.
pub fn is_library_file(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str) == Some(DLL_EXTENSION)
}

/// Platform file name for a library stem, e.g. `hello` → `libhello.so`.
pub fn library_file_name(stem: &str) -> String {
    format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}")
}

/// Shared libraries directly inside `dir`, sorted by path.
///
/// A missing or unreadable directory yields an empty list. Subdirectories
/// are not searched.
pub fn discover(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if dir.exists() {
                warn!(dir = %dir.display(), error = %e, "Cannot read unit directory");
            } else {
                debug!(dir = %dir.display(), "Unit directory does not exist");
            }
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_library_file(path))
        .collect();
    found.sort();

    debug!(dir = %dir.display(), count = found.len(), "Discovered unit libraries");
    found
}
