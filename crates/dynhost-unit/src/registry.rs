//! Interface registry, a process-wide log of discovered units.
//!
//! One registry exists per unit kind ([`module_interface`] and
//! [`plugin_interface`]). It records the names of units that loaded, the
//! metadata of the currently loaded set, and every load or unload error.
//! Entries are never removed: it is a discovery log, not a live index.

use std::sync::{Arc, LazyLock, RwLock};

use serde::Serialize;

use crate::unit::CapabilityMetadata;

/// Snapshot of a registry's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceRecord {
    /// Unit names in the order they were added.
    pub names: Vec<String>,
    /// Metadata records from the last bulk `add_detail`.
    pub details: Vec<CapabilityMetadata>,
    /// Error messages in the order they were recorded.
    pub errors: Vec<String>,
}

/// Aggregated names, metadata and errors for one unit kind.
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    record: RwLock<InterfaceRecord>,
}

static MODULE_INTERFACE_DATA: LazyLock<Arc<InterfaceRegistry>> =
    LazyLock::new(|| Arc::new(InterfaceRegistry::new()));

static PLUGIN_INTERFACE_DATA: LazyLock<Arc<InterfaceRegistry>> =
    LazyLock::new(|| Arc::new(InterfaceRegistry::new()));

/// The process-wide module registry, created on first access.
pub fn module_interface() -> Arc<InterfaceRegistry> {
    Arc::clone(&MODULE_INTERFACE_DATA)
}

/// The process-wide plugin registry, created on first access.
pub fn plugin_interface() -> Arc<InterfaceRegistry> {
    Arc::clone(&PLUGIN_INTERFACE_DATA)
}

impl InterfaceRegistry {
    /// Creates an empty, private registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the metadata list with `details`.
    pub fn add_detail(&self, details: Vec<CapabilityMetadata>) {
        self.write().details = details;
    }

    /// Appends one unit name.
    pub fn add_name(&self, name: impl Into<String>) {
        self.write().names.push(name.into());
    }

    /// Appends one error message.
    pub fn set_error(&self, message: impl Into<String>) {
        self.write().errors.push(message.into());
    }

    /// Current metadata list.
    pub fn get_detail(&self) -> Vec<CapabilityMetadata> {
        self.read().details.clone()
    }

    /// All recorded names.
    pub fn get_names(&self) -> Vec<String> {
        self.read().names.clone()
    }

    /// All recorded errors.
    pub fn get_errors(&self) -> Vec<String> {
        self.read().errors.clone()
    }

    /// Copy of everything at once.
    pub fn snapshot(&self) -> InterfaceRecord {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InterfaceRecord> {
        self.record.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InterfaceRecord> {
        self.record.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::{ModuleType, UnitType};

    #[test]
    fn test_names_and_errors_append() {
        let registry = InterfaceRegistry::new();
        registry.add_name("alpha");
        registry.add_name("beta");
        registry.set_error("could not load library 'gamma'");

        assert_eq!(registry.get_names(), vec!["alpha", "beta"]);
        assert_eq!(registry.get_errors().len(), 1);
    }

    #[test]
    fn test_add_detail_replaces() {
        let registry = InterfaceRegistry::new();
        let meta = CapabilityMetadata::new(UnitType::Module(ModuleType::Index));

        registry.add_detail(vec![meta.clone(), meta.clone()]);
        assert_eq!(registry.get_detail().len(), 2);

        registry.add_detail(vec![meta]);
        assert_eq!(registry.get_detail().len(), 1);
    }

    #[test]
    fn test_singletons_are_shared_per_kind() {
        assert!(Arc::ptr_eq(&module_interface(), &module_interface()));
        assert!(!Arc::ptr_eq(&module_interface(), &plugin_interface()));
    }
}
