//! Prelude for convenient imports.

pub use crate::error::UnitError;
pub use crate::handle::UnitRef;
pub use crate::manager::{ModuleManager, PluginManager, UnloadOutcome};
pub use crate::unit::{
    Capability, CapabilityMetadata, CodeName, Module, ModuleType, Permission, Plugin,
    PluginState, PluginType, UnitType,
};

pub use crate::{export_module, export_plugin};
