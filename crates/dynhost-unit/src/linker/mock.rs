//! In-memory dynamic linker for development and testing.
//!
//! Simulates the OS loader without touching the filesystem: libraries are
//! registered by name together with the symbols they export, and every
//! open/close is counted so tests can check that no handle leaks.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{DynamicLinker, LinkError};
use crate::ffi::{CreateModuleFn, CreatePluginFn, DestroyFn, RawSymbol};
use crate::ffi::abi::{
    CREATE_MODULE_SYMBOL, CREATE_PLUGIN_SYMBOL, DESTROY_MODULE_SYMBOL, DESTROY_PLUGIN_SYMBOL,
};

/// Exports of one fake library.
#[derive(Debug, Clone, Default)]
pub struct MockLibrary {
    symbols: HashMap<String, RawSymbol>,
}

impl MockLibrary {
    /// A library with no exports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary export.
    pub fn with_symbol(mut self, name: impl Into<String>, symbol: RawSymbol) -> Self {
        self.symbols.insert(name.into(), symbol);
        self
    }

    /// A module library exporting `CreateModule` and, if given, `DestroyModule`.
    pub fn module(create: CreateModuleFn, destroy: Option<DestroyFn>) -> Self {
        let lib = Self::new().with_symbol(
            CREATE_MODULE_SYMBOL,
            RawSymbol::from_module_factory(create),
        );
        match destroy {
            Some(f) => lib.with_symbol(DESTROY_MODULE_SYMBOL, RawSymbol::from_destroy(f)),
            None => lib,
        }
    }

    /// A plugin library exporting `CreatePlugin` and, if given, `DestroyPlugin`.
    pub fn plugin(create: CreatePluginFn, destroy: Option<DestroyFn>) -> Self {
        let lib = Self::new().with_symbol(
            CREATE_PLUGIN_SYMBOL,
            RawSymbol::from_plugin_factory(create),
        );
        match destroy {
            Some(f) => lib.with_symbol(DESTROY_PLUGIN_SYMBOL, RawSymbol::from_destroy(f)),
            None => lib,
        }
    }
}

/// Handle returned by [`MockLinker::open`].
#[derive(Debug)]
pub struct MockHandle {
    id: u64,
    name: String,
}

#[derive(Debug, Default)]
struct MockState {
    libraries: HashMap<String, MockLibrary>,
    opens: HashMap<String, usize>,
    closes: HashMap<String, usize>,
    live: HashSet<u64>,
    next_id: u64,
}

/// Linker that serves registered [`MockLibrary`] values.
#[derive(Debug, Default)]
pub struct MockLinker {
    state: Mutex<MockState>,
}

impl MockLinker {
    /// Creates a linker with no libraries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `library` openable under `name`.
    pub fn register(&self, name: impl Into<String>, library: MockLibrary) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.libraries.insert(name.into(), library);
    }

    /// Builder form of [`MockLinker::register`].
    pub fn with_library(self, name: impl Into<String>, library: MockLibrary) -> Self {
        self.register(name, library);
        self
    }

    /// Successful opens of `name` so far.
    pub fn open_count(&self, name: &str) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.opens.get(name).copied().unwrap_or(0)
    }

    /// Closes of `name` so far.
    pub fn close_count(&self, name: &str) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.closes.get(name).copied().unwrap_or(0)
    }

    /// Handles opened and not yet closed, across all libraries.
    pub fn live_handles(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.live.len()
    }
}

impl DynamicLinker for MockLinker {
    type Handle = MockHandle;

    fn open(&self, name: &str) -> Result<MockHandle, LinkError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.libraries.contains_key(name) {
            tracing::debug!("[MockLinker] No library registered as '{}'", name);
            return Err(LinkError::new(name, "no such library"));
        }

        state.next_id += 1;
        let id = state.next_id;
        state.live.insert(id);
        *state.opens.entry(name.to_string()).or_insert(0) += 1;

        tracing::debug!("[MockLinker] Opened '{}' (handle {})", name, id);
        Ok(MockHandle {
            id,
            name: name.to_string(),
        })
    }

    fn resolve(&self, handle: &MockHandle, symbol: &str) -> Option<RawSymbol> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.live.contains(&handle.id) {
            tracing::warn!("[MockLinker] Resolve on closed handle {}", handle.id);
            return None;
        }
        state
            .libraries
            .get(&handle.name)
            .and_then(|lib| lib.symbols.get(symbol).copied())
    }

    fn close(&self, handle: MockHandle) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.live.remove(&handle.id) {
            *state.closes.entry(handle.name.clone()).or_insert(0) += 1;
            tracing::debug!("[MockLinker] Closed '{}' (handle {})", handle.name, handle.id);
        }
    }
}
