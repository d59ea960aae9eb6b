//! # dynhost-unit
//!
//! Dynamic unit loading for dynhost. Provides:
//!
//! - Capability contracts for loadable modules and plugins
//! - Per-kind interface registries (names, metadata, errors)
//! - A platform dynamic-link shim over `libloading`
//! - Unit managers with idempotent load and symmetric unload
//! - Directory discovery and export macros for unit libraries

pub mod discovery;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod linker;
pub mod macros;
pub mod manager;
pub mod prelude;
pub mod registry;
pub mod unit;

pub use error::UnitError;
pub use handle::{UnitGuard, UnitRef};
pub use linker::{DynamicLinker, LinkError, SystemLinker};
pub use manager::{
    LoadFailure, LoadReport, LoadedUnitInfo, ModuleManager, PluginManager, UnitManager,
    UnloadOutcome,
};
pub use registry::{InterfaceRecord, InterfaceRegistry, module_interface, plugin_interface};
pub use unit::{Capability, CapabilityMetadata, Module, ModuleKind, Plugin, PluginKind, UnitKind};
