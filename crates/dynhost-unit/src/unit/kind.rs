//! Unit kinds: the two instantiations of the loader pattern.

use std::sync::Arc;

use crate::ffi::abi::{self, RawSymbol};
use crate::registry::{self, InterfaceRegistry};
use crate::unit::{Capability, CapabilityMetadata, Module, Plugin};

/// Everything the manager needs to know about one kind of unit.
pub trait UnitKind: Send + Sync + 'static {
    /// Trait object the factory produces.
    type Unit: ?Sized + Capability + 'static;

    /// Lower-case label used in logs and messages.
    const LABEL: &'static str;

    /// Name of the factory export.
    const CREATE_SYMBOL: &'static str;

    /// Name of the teardown export.
    const DESTROY_SYMBOL: &'static str;

    /// The process-wide interface registry for this kind.
    fn interface() -> Arc<InterfaceRegistry>;

    /// Snapshot of a live unit's metadata.
    fn metadata(unit: &Self::Unit) -> CapabilityMetadata;

    /// Calls a resolved factory.
    ///
    /// # Safety
    ///
    /// `factory` must have been resolved under [`Self::CREATE_SYMBOL`] from a
    /// library that is still mapped.
    unsafe fn create(factory: RawSymbol) -> *mut Self::Unit;
}

/// Marker for [`Module`] units.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleKind;

/// Marker for [`Plugin`] units.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginKind;

impl UnitKind for ModuleKind {
    type Unit = dyn Module;

    const LABEL: &'static str = "module";
    const CREATE_SYMBOL: &'static str = abi::CREATE_MODULE_SYMBOL;
    const DESTROY_SYMBOL: &'static str = abi::DESTROY_MODULE_SYMBOL;

    fn interface() -> Arc<InterfaceRegistry> {
        registry::module_interface()
    }

    fn metadata(unit: &dyn Module) -> CapabilityMetadata {
        CapabilityMetadata::from_module(unit)
    }

    unsafe fn create(factory: RawSymbol) -> *mut dyn Module {
        unsafe { (factory.as_module_factory())() }
    }
}

impl UnitKind for PluginKind {
    type Unit = dyn Plugin;

    const LABEL: &'static str = "plugin";
    const CREATE_SYMBOL: &'static str = abi::CREATE_PLUGIN_SYMBOL;
    const DESTROY_SYMBOL: &'static str = abi::DESTROY_PLUGIN_SYMBOL;

    fn interface() -> Arc<InterfaceRegistry> {
        registry::plugin_interface()
    }

    fn metadata(unit: &dyn Plugin) -> CapabilityMetadata {
        CapabilityMetadata::from_plugin(unit)
    }

    unsafe fn create(factory: RawSymbol) -> *mut dyn Plugin {
        unsafe { (factory.as_plugin_factory())() }
    }
}
