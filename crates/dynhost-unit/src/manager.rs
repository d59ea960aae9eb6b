//! Unit manager: loads, tracks and unloads units of one kind.
//!
//! A manager keeps two maps keyed by the name passed to [`UnitManager::load`]
//! (canonicalised by the linker): key → unit handle and key → OS library
//! handle. Both live under one mutex. A `load` holds it throughout, so a key
//! is opened by the OS loader at most once. An `unload` holds it while it
//! removes the key from both maps, then releases it before waiting for
//! outstanding [`UnitGuard`](crate::handle::UnitGuard)s and running the
//! teardown export, so a thread holding a guard can keep using the manager.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::discovery;
use crate::error::UnitError;
use crate::handle::{UnitRef, live_units};
use crate::linker::{DynamicLinker, SystemLinker};
use crate::registry::InterfaceRegistry;
use crate::unit::{CapabilityMetadata, ModuleKind, PluginKind, UnitKind};

/// Manager for [`Module`](crate::unit::Module) libraries.
pub type ModuleManager<L = SystemLinker> = UnitManager<ModuleKind, L>;

/// Manager for [`Plugin`](crate::unit::Plugin) libraries.
pub type PluginManager<L = SystemLinker> = UnitManager<PluginKind, L>;

/// What [`UnitManager::unload`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadOutcome {
    /// The caller passed an empty handle.
    Skipped,
    /// This manager had no such unit loaded.
    NotLoaded,
    /// The library was closed and forgotten. `destroyed` is `false` when the
    /// library did not export its teardown function.
    Unloaded {
        /// Whether the teardown export ran.
        destroyed: bool,
    },
}

/// Listing entry for one loaded unit.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedUnitInfo {
    /// Library name or path the unit was loaded from.
    pub key: String,
    /// Metadata captured at load time.
    pub metadata: CapabilityMetadata,
    /// When the load completed.
    pub loaded_at: DateTime<Utc>,
}

/// One library that [`UnitManager::load_dir`] could not load.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// Library path.
    pub path: PathBuf,
    /// Why it failed.
    pub error: UnitError,
}

/// Result of loading every library in a directory.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Keys that are loaded after the scan, in scan order.
    pub loaded: Vec<String>,
    /// Libraries that failed.
    pub failed: Vec<LoadFailure>,
}

struct LoadedEntry<K: UnitKind> {
    unit: UnitRef<K>,
    metadata: CapabilityMetadata,
    loaded_at: DateTime<Utc>,
}

struct LoadedUnits<K: UnitKind, H> {
    units: HashMap<String, LoadedEntry<K>>,
    handles: HashMap<String, H>,
    last_load_ok: bool,
}

/// Loads shared libraries exporting the `K` unit ABI through linker `L`.
pub struct UnitManager<K: UnitKind, L: DynamicLinker = SystemLinker> {
    linker: L,
    interface: Arc<InterfaceRegistry>,
    state: Mutex<LoadedUnits<K, L::Handle>>,
}

impl<K: UnitKind> UnitManager<K, SystemLinker> {
    /// Manager over the OS loader reporting into the process-wide registry.
    pub fn new() -> Self {
        Self::with_linker(SystemLinker, K::interface())
    }
}

impl<K: UnitKind> Default for UnitManager<K, SystemLinker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: UnitKind, L: DynamicLinker> UnitManager<K, L> {
    /// Manager over a custom linker and interface registry.
    pub fn with_linker(linker: L, interface: Arc<InterfaceRegistry>) -> Self {
        Self {
            linker,
            interface,
            state: Mutex::new(LoadedUnits {
                units: HashMap::new(),
                handles: HashMap::new(),
                last_load_ok: false,
            }),
        }
    }

    /// The linker this manager opens libraries with.
    pub fn linker(&self) -> &L {
        &self.linker
    }

    /// The registry this manager reports into.
    pub fn interface(&self) -> &Arc<InterfaceRegistry> {
        &self.interface
    }

    /// Loads the library `name` and returns its unit.
    ///
    /// Loading a name that is already loaded returns the existing unit
    /// without touching the OS loader. So does loading the same library
    /// under a second name: the extra OS handle is closed again and the
    /// unit keeps its first key. Every failure closes whatever was opened,
    /// records a message in the interface registry and leaves both maps
    /// untouched.
    pub fn load(&self, name: &str) -> Result<UnitRef<K>, UnitError> {
        let key = self.linker.canonical_name(name);
        let mut state = self.lock();

        if let Some(entry) = state.units.get(&key) {
            info!(kind = K::LABEL, library = %key, "Unit already loaded");
            let unit = entry.unit.clone();
            state.last_load_ok = true;
            return Ok(unit);
        }

        let result = self.open_unit(&key);
        match result {
            Ok((unit, metadata, handle)) => {
                let alias = state
                    .units
                    .values()
                    .find(|entry| UnitRef::ptr_eq(&entry.unit, &unit))
                    .map(|entry| entry.unit.clone());
                if let Some(existing) = alias {
                    info!(
                        kind = K::LABEL,
                        library = %key,
                        loaded_as = %existing.key(),
                        "Unit already loaded under another name"
                    );
                    self.linker.close(handle);
                    state.last_load_ok = true;
                    return Ok(existing);
                }

                info!(
                    kind = K::LABEL,
                    library = %key,
                    unit = %metadata.name_or(&key),
                    version = metadata.version.as_deref().unwrap_or("-"),
                    "Unit loaded"
                );
                self.interface.add_name(metadata.name_or(&key));
                state.units.insert(
                    key.clone(),
                    LoadedEntry {
                        unit: unit.clone(),
                        metadata,
                        loaded_at: Utc::now(),
                    },
                );
                state.handles.insert(key, handle);
                state.last_load_ok = true;
                self.publish_details(&state);
                Ok(unit)
            }
            Err(e) => {
                error!(kind = K::LABEL, library = %key, error = %e, "Unit load failed");
                self.interface.set_error(e.to_string());
                state.last_load_ok = false;
                Err(e)
            }
        }
    }

    /// Opens, resolves and instantiates without touching the maps.
    fn open_unit(
        &self,
        name: &str,
    ) -> Result<(UnitRef<K>, CapabilityMetadata, L::Handle), UnitError> {
        let handle = self.linker.open(name).map_err(|e| UnitError::LibraryOpen {
            name: name.to_string(),
            reason: e.reason,
        })?;
        debug!(kind = K::LABEL, library = %name, "Library opened");

        let Some(factory) = self.linker.resolve(&handle, K::CREATE_SYMBOL) else {
            self.linker.close(handle);
            return Err(UnitError::MissingSymbol {
                name: name.to_string(),
                symbol: K::CREATE_SYMBOL,
            });
        };

        // No teardown can run while the table is held, so the object the
        // factory hands back stays valid until it has been adopted.
        let mut live = live_units();
        let created = panic::catch_unwind(AssertUnwindSafe(|| {
            // SAFETY: factory was resolved under K::CREATE_SYMBOL from the
            // library we still hold open.
            let raw = unsafe { K::create(factory) };
            NonNull::new(raw).map(|ptr| {
                // SAFETY: the factory returned a live object.
                let metadata = K::metadata(unsafe { ptr.as_ref() });
                (ptr, metadata)
            })
        }));

        match created {
            Ok(Some((ptr, metadata))) => Ok((live.adopt(name, ptr), metadata, handle)),
            Ok(None) => {
                drop(live);
                self.linker.close(handle);
                Err(UnitError::FactoryReturnedNull {
                    name: name.to_string(),
                    symbol: K::CREATE_SYMBOL,
                })
            }
            Err(payload) => {
                drop(live);
                self.linker.close(handle);
                Err(UnitError::FactoryPanicked {
                    name: name.to_string(),
                    symbol: K::CREATE_SYMBOL,
                    message: panic_message(payload.as_ref()),
                })
            }
        }
    }

    /// Unloads the unit in `unit` and empties the option in every case.
    ///
    /// The unit is looked up by the key it was loaded under. A handle that
    /// this manager does not currently hold is reported as
    /// [`UnloadOutcome::NotLoaded`] with a warning. A missing teardown export
    /// is logged and recorded, and the library is closed anyway.
    ///
    /// Blocks until every [`UnitGuard`](crate::handle::UnitGuard) on the unit
    /// is dropped, so it must not be called by a thread holding one.
    pub fn unload(&self, unit: &mut Option<UnitRef<K>>) -> UnloadOutcome {
        let Some(target) = unit.take() else {
            return UnloadOutcome::Skipped;
        };

        let detached = {
            let mut state = self.lock();
            let held = state
                .units
                .get(target.key())
                .is_some_and(|entry| UnitRef::ptr_eq(&entry.unit, &target));
            if !held {
                warn!(
                    kind = K::LABEL,
                    library = %target.key(),
                    "Trying to unload a unit that was never loaded"
                );
                return UnloadOutcome::NotLoaded;
            }
            self.detach(&mut state, target.key())
        };

        match detached {
            Some((unit, handle)) => self.teardown(target.key(), unit, handle),
            None => UnloadOutcome::NotLoaded,
        }
    }

    /// Unloads the unit loaded under `key`, if any.
    pub fn unload_key(&self, key: &str) -> UnloadOutcome {
        let key = self.linker.canonical_name(key);
        let detached = {
            let mut state = self.lock();
            if !state.units.contains_key(&key) {
                warn!(
                    kind = K::LABEL,
                    library = %key,
                    "Trying to unload a unit that was never loaded"
                );
                return UnloadOutcome::NotLoaded;
            }
            self.detach(&mut state, &key)
        };

        match detached {
            Some((unit, handle)) => self.teardown(&key, unit, handle),
            None => UnloadOutcome::NotLoaded,
        }
    }

    /// Unloads everything. Returns how many units were unloaded.
    pub fn unload_all(&self) -> usize {
        let detached: Vec<(String, UnitRef<K>, L::Handle)> = {
            let mut state = self.lock();
            let mut keys: Vec<String> = state.units.keys().cloned().collect();
            keys.sort();
            keys.into_iter()
                .filter_map(|key| {
                    let (unit, handle) = self.detach(&mut state, &key)?;
                    Some((key, unit, handle))
                })
                .collect()
        };

        let count = detached.len();
        for (key, unit, handle) in detached {
            self.teardown(&key, unit, handle);
        }
        count
    }

    /// Removes `key` from both maps.
    fn detach(
        &self,
        state: &mut LoadedUnits<K, L::Handle>,
        key: &str,
    ) -> Option<(UnitRef<K>, L::Handle)> {
        let entry = state.units.remove(key);
        let handle = state.handles.remove(key);
        self.publish_details(state);

        match (entry, handle) {
            (Some(entry), Some(handle)) => Some((entry.unit, handle)),
            (_, handle) => {
                // Unreachable while both maps are only changed together.
                error!(kind = K::LABEL, library = %key, "Loaded unit has no library handle");
                if let Some(handle) = handle {
                    self.linker.close(handle);
                }
                None
            }
        }
    }

    /// Retires the unit, runs the teardown export and closes the library.
    /// Runs without the manager lock.
    fn teardown(&self, key: &str, unit: UnitRef<K>, handle: L::Handle) -> UnloadOutcome {
        // Blocks until every outstanding UnitGuard is dropped.
        let destroyed = if unit.retire() {
            let mut live = live_units();
            let destroyed = self.destroy(key, &handle);
            live.release(&unit);
            destroyed
        } else {
            warn!(
                kind = K::LABEL,
                library = %key,
                "Unit was already torn down through another handle"
            );
            false
        };

        self.linker.close(handle);
        info!(kind = K::LABEL, library = %key, destroyed, "Unit unloaded");

        UnloadOutcome::Unloaded { destroyed }
    }

    fn destroy(&self, key: &str, handle: &L::Handle) -> bool {
        match self.linker.resolve(handle, K::DESTROY_SYMBOL) {
            Some(destroy) => {
                // SAFETY: resolved under K::DESTROY_SYMBOL from the open
                // library; the unit has been retired.
                let ran =
                    panic::catch_unwind(AssertUnwindSafe(|| unsafe { (destroy.as_destroy())() }));
                if ran.is_err() {
                    error!(kind = K::LABEL, library = %key, "Unit teardown panicked");
                    self.interface
                        .set_error(format!("'{}' in '{}' panicked", K::DESTROY_SYMBOL, key));
                }
                ran.is_ok()
            }
            None => {
                error!(
                    kind = K::LABEL,
                    library = %key,
                    symbol = K::DESTROY_SYMBOL,
                    "Library does not export its teardown function"
                );
                self.interface.set_error(format!(
                    "library '{}' does not export '{}'",
                    key,
                    K::DESTROY_SYMBOL
                ));
                false
            }
        }
    }

    /// Loads every shared library found directly inside `dir`.
    ///
    /// Failures are collected and do not stop the scan.
    pub fn load_dir(&self, dir: &Path) -> LoadReport {
        let mut report = LoadReport::default();
        for path in discovery::discover(dir) {
            let key = path.to_string_lossy().into_owned();
            match self.load(&key) {
                Ok(unit) => report.loaded.push(unit.key().to_string()),
                Err(error) => {
                    warn!(kind = K::LABEL, path = %path.display(), error = %error, "Skipping library");
                    report.failed.push(LoadFailure { path, error });
                }
            }
        }
        info!(
            kind = K::LABEL,
            dir = %dir.display(),
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Directory scan finished"
        );
        report
    }

    /// Whether the most recent `load` succeeded.
    ///
    /// This is one flag for the whole manager, not a per-unit status. Use
    /// [`UnitManager::contains`] to ask about a specific library.
    pub fn is_loaded(&self) -> bool {
        self.lock().last_load_ok
    }

    /// Whether a unit is loaded under `key`.
    pub fn contains(&self, key: &str) -> bool {
        let key = self.linker.canonical_name(key);
        self.lock().units.contains_key(&key)
    }

    /// The unit loaded under `key`.
    pub fn get(&self, key: &str) -> Option<UnitRef<K>> {
        let key = self.linker.canonical_name(key);
        self.lock().units.get(&key).map(|entry| entry.unit.clone())
    }

    /// Number of loaded units.
    pub fn len(&self) -> usize {
        self.lock().units.len()
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.lock().units.is_empty()
    }

    /// Keys of the unit map, sorted.
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().units.keys().cloned().collect();
        names.sort();
        names
    }

    /// Keys of the library-handle map, sorted.
    pub fn handle_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().handles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Loaded units with their metadata, sorted by key.
    pub fn list(&self) -> Vec<LoadedUnitInfo> {
        let state = self.lock();
        let mut infos: Vec<LoadedUnitInfo> = state
            .units
            .iter()
            .map(|(key, entry)| LoadedUnitInfo {
                key: key.clone(),
                metadata: entry.metadata.clone(),
                loaded_at: entry.loaded_at,
            })
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    fn publish_details(&self, state: &LoadedUnits<K, L::Handle>) {
        let mut keys: Vec<&String> = state.units.keys().collect();
        keys.sort();
        let details = keys
            .into_iter()
            .filter_map(|key| state.units.get(key).map(|entry| entry.metadata.clone()))
            .collect();
        self.interface.add_detail(details);
    }

    fn lock(&self) -> MutexGuard<'_, LoadedUnits<K, L::Handle>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<K: UnitKind, L: DynamicLinker> Drop for UnitManager<K, L> {
    fn drop(&mut self) {
        // Handles must not outlive the libraries their objects live in.
        let unloaded = self.unload_all();
        if unloaded > 0 {
            debug!(kind = K::LABEL, unloaded, "Manager dropped with units still loaded");
        }
    }
}

impl<K: UnitKind, L: DynamicLinker> std::fmt::Debug for UnitManager<K, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitManager")
            .field("kind", &K::LABEL)
            .field("loaded", &self.loaded_names())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
