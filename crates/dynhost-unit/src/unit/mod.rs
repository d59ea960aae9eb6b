//! Capability contracts every loadable unit implements.
//!
//! A unit is either a [`Module`] or a [`Plugin`]. Both share the
//! [`Capability`] getters and the `run` entry point; they differ in the
//! type tag they report, and plugins additionally carry a permission and
//! a lifecycle state.
//!
//! Getters are pure queries. They must not panic and return `None` for
//! anything the unit does not specify.

pub mod kind;
pub mod metadata;

pub use kind::{ModuleKind, PluginKind, UnitKind};
pub use metadata::{
    CapabilityMetadata, CodeName, ModuleType, Permission, PluginState, PluginType, UnitType,
};

/// Identity getters and entry point shared by modules and plugins.
pub trait Capability: Send + Sync {
    /// Optional numeric or string id.
    fn code_name(&self) -> Option<CodeName> {
        None
    }

    /// Display name.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Free-form description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Build date, usually taken from the build environment.
    fn compiled_date(&self) -> Option<&str> {
        None
    }

    /// License tag.
    fn license(&self) -> Option<&str> {
        None
    }

    /// Version string.
    fn version(&self) -> Option<&str> {
        None
    }

    /// Author.
    fn author(&self) -> Option<&str> {
        None
    }

    /// Homepage.
    fn url(&self) -> Option<&str> {
        None
    }

    /// The unit's action. Side effects are entirely up to the unit; the
    /// host neither inspects nor sandboxes them.
    fn run(&self) -> Result<(), String>;
}

/// A loadable module.
pub trait Module: Capability {
    /// Category of this module.
    fn module_type(&self) -> ModuleType;
}

/// A loadable plugin.
pub trait Plugin: Capability {
    /// Category of this plugin.
    fn plugin_type(&self) -> PluginType;

    /// Access level the plugin asks for.
    fn permission(&self) -> Option<Permission> {
        None
    }

    /// Lifecycle state the plugin reports.
    fn state(&self) -> Option<PluginState> {
        None
    }
}

/// Copies the shared getters into a metadata record.
fn collect<U: Capability + ?Sized>(unit: &U, unit_type: UnitType) -> CapabilityMetadata {
    let owned = |value: Option<&str>| value.map(str::to_string);
    CapabilityMetadata {
        code_name: unit.code_name(),
        name: owned(unit.name()),
        description: owned(unit.description()),
        compiled_date: owned(unit.compiled_date()),
        license: owned(unit.license()),
        version: owned(unit.version()),
        author: owned(unit.author()),
        url: owned(unit.url()),
        unit_type,
        permission: None,
        state: None,
    }
}

impl CapabilityMetadata {
    /// Snapshot of a module's metadata.
    pub fn from_module(module: &dyn Module) -> Self {
        collect(module, UnitType::Module(module.module_type()))
    }

    /// Snapshot of a plugin's metadata.
    pub fn from_plugin(plugin: &dyn Plugin) -> Self {
        let mut meta = collect(plugin, UnitType::Plugin(plugin.plugin_type()));
        meta.permission = plugin.permission();
        meta.state = plugin.state();
        meta
    }
}
