//! Shared fakes for manager integration tests.
//!
//! Each `fake_*_library!` invocation defines a module with its own
//! instance slot and counters, so tests running in parallel never share
//! state.

#![allow(dead_code)]

use std::sync::Arc;

use dynhost_unit::linker::MockLinker;
use dynhost_unit::prelude::*;
use dynhost_unit::{InterfaceRegistry, UnitKind, UnitManager};

/// Module unit served by fake libraries.
pub struct FakeModule {
    pub name: &'static str,
}

impl Capability for FakeModule {
    fn name(&self) -> Option<&str> {
        Some(self.name)
    }

    fn version(&self) -> Option<&str> {
        Some("1.0.0")
    }

    fn run(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Module for FakeModule {
    fn module_type(&self) -> ModuleType {
        ModuleType::Default
    }
}

/// Plugin unit served by fake libraries.
pub struct FakePlugin {
    pub name: &'static str,
}

impl Capability for FakePlugin {
    fn name(&self) -> Option<&str> {
        Some(self.name)
    }

    fn run(&self) -> Result<(), String> {
        Err(format!("{} refuses to run", self.name))
    }
}

impl Plugin for FakePlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::Cron
    }

    fn permission(&self) -> Option<Permission> {
        Some(Permission::ReadOnly)
    }

    fn state(&self) -> Option<PluginState> {
        Some(PluginState::Active)
    }
}

/// Defines `mod $lib` with `create`/`destroy` exports serving one
/// [`FakeModule`] named `$name`, plus `library()` and call counters.
#[allow(unused_macros)]
macro_rules! fake_module_library {
    ($lib:ident, $name:literal) => {
        #[allow(dead_code)]
        mod $lib {
            use std::sync::atomic::{AtomicUsize, Ordering};

            use dynhost_unit::ffi::InstanceSlot;
            use dynhost_unit::linker::MockLibrary;
            use dynhost_unit::unit::Module;

            use crate::helpers::FakeModule;

            static SLOT: InstanceSlot<dyn Module> = InstanceSlot::new();
            static CREATES: AtomicUsize = AtomicUsize::new(0);
            static DESTROYS: AtomicUsize = AtomicUsize::new(0);

            #[allow(improper_ctypes_definitions)]
            pub unsafe extern "C-unwind" fn create() -> *mut dyn Module {
                CREATES.fetch_add(1, Ordering::SeqCst);
                SLOT.get_or_create(|| -> Box<dyn Module> { Box::new(FakeModule { name: $name }) })
                    .as_ptr()
            }

            pub unsafe extern "C-unwind" fn destroy() {
                if SLOT.destroy() {
                    DESTROYS.fetch_add(1, Ordering::SeqCst);
                }
            }

            pub fn library() -> MockLibrary {
                MockLibrary::module(create, Some(destroy))
            }

            pub fn library_without_destroy() -> MockLibrary {
                MockLibrary::module(create, None)
            }

            pub fn creates() -> usize {
                CREATES.load(Ordering::SeqCst)
            }

            pub fn destroys() -> usize {
                DESTROYS.load(Ordering::SeqCst)
            }

            pub fn is_live() -> bool {
                SLOT.is_live()
            }
        }
    };
}

/// Plugin counterpart of `fake_module_library!`.
#[allow(unused_macros)]
macro_rules! fake_plugin_library {
    ($lib:ident, $name:literal) => {
        #[allow(dead_code)]
        mod $lib {
            use std::sync::atomic::{AtomicUsize, Ordering};

            use dynhost_unit::ffi::InstanceSlot;
            use dynhost_unit::linker::MockLibrary;
            use dynhost_unit::unit::Plugin;

            use crate::helpers::FakePlugin;

            static SLOT: InstanceSlot<dyn Plugin> = InstanceSlot::new();
            static DESTROYS: AtomicUsize = AtomicUsize::new(0);

            #[allow(improper_ctypes_definitions)]
            pub unsafe extern "C-unwind" fn create() -> *mut dyn Plugin {
                SLOT.get_or_create(|| -> Box<dyn Plugin> { Box::new(FakePlugin { name: $name }) })
                    .as_ptr()
            }

            pub unsafe extern "C-unwind" fn destroy() {
                if SLOT.destroy() {
                    DESTROYS.fetch_add(1, Ordering::SeqCst);
                }
            }

            pub fn library() -> MockLibrary {
                MockLibrary::plugin(create, Some(destroy))
            }

            pub fn destroys() -> usize {
                DESTROYS.load(Ordering::SeqCst)
            }
        }
    };
}

/// Factory that declines to produce a module.
#[allow(improper_ctypes_definitions)]
pub unsafe extern "C-unwind" fn null_module_factory() -> *mut dyn Module {
    std::ptr::null_mut::<FakeModule>()
}

/// Factory that unwinds.
#[allow(improper_ctypes_definitions)]
pub unsafe extern "C-unwind" fn panicking_module_factory() -> *mut dyn Module {
    panic!("factory exploded")
}

/// Teardown that does nothing.
pub unsafe extern "C-unwind" fn noop_destroy() {}

/// Module manager over `linker` with a private registry.
pub fn module_manager(linker: MockLinker) -> ModuleManager<MockLinker> {
    UnitManager::with_linker(linker, Arc::new(InterfaceRegistry::new()))
}

/// Plugin manager over `linker` with a private registry.
pub fn plugin_manager(linker: MockLinker) -> PluginManager<MockLinker> {
    UnitManager::with_linker(linker, Arc::new(InterfaceRegistry::new()))
}

/// Both maps of a manager hold the same keys.
pub fn assert_maps_agree<K: UnitKind>(manager: &UnitManager<K, MockLinker>) {
    assert_eq!(manager.loaded_names(), manager.handle_names());
}
