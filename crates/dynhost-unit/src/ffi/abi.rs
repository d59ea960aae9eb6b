//! Unit ABI definitions.
//!
//! A shared library is a loadable unit when it exports two functions with
//! fixed, convention-based names:
//!
//! | Kind   | Factory        | Teardown        |
//! |--------|----------------|-----------------|
//! | module | `CreateModule` | `DestroyModule` |
//! | plugin | `CreatePlugin` | `DestroyPlugin` |
//!
//! The factory takes no arguments and returns a pointer to an object
//! implementing the kind's trait. The object is allocated by the library
//! and must be released by the library: the host calls the teardown
//! function (no arguments) and never frees the pointer itself.
//!
//! Trait-object pointers are only meaningful between binaries built with
//! the same toolchain against the same `dynhost-unit` version. Use the
//! `export_module!` / `export_plugin!` macros rather than writing these
//! exports by hand.

use std::ffi::c_void;
use std::ptr::NonNull;

use crate::unit::{Module, Plugin};

/// Name and revision of the export convention described above.
pub const UNIT_ABI: &str = "dynhost-unit-abi/1";

/// Factory export of a module library.
pub const CREATE_MODULE_SYMBOL: &str = "CreateModule";
/// Teardown export of a module library.
pub const DESTROY_MODULE_SYMBOL: &str = "DestroyModule";
/// Factory export of a plugin library.
pub const CREATE_PLUGIN_SYMBOL: &str = "CreatePlugin";
/// Teardown export of a plugin library.
pub const DESTROY_PLUGIN_SYMBOL: &str = "DestroyPlugin";

/// Signature of `CreateModule`.
#[allow(improper_ctypes_definitions)]
pub type CreateModuleFn = unsafe extern "C-unwind" fn() -> *mut dyn Module;

/// Signature of `CreatePlugin`.
#[allow(improper_ctypes_definitions)]
pub type CreatePluginFn = unsafe extern "C-unwind" fn() -> *mut dyn Plugin;

/// Signature of `DestroyModule` / `DestroyPlugin`.
pub type DestroyFn = unsafe extern "C-unwind" fn();

/// Address of a resolved export.
///
/// Only ever non-null. What it points to is decided by the symbol name it
/// was resolved under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSymbol(NonNull<c_void>);

// SAFETY: a RawSymbol is a code address inside a mapped library. It is
// never dereferenced as data, only reinterpreted as a function pointer.
unsafe impl Send for RawSymbol {}
unsafe impl Sync for RawSymbol {}

impl RawSymbol {
    /// Wraps an export address. Returns `None` for null.
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Self)
    }

    /// The raw address.
    pub fn as_ptr(&self) -> *const c_void {
        self.0.as_ptr()
    }

    /// Address of an in-process module factory.
    pub fn from_module_factory(f: CreateModuleFn) -> Self {
        // SAFETY: function pointers are never null.
        Self(unsafe { NonNull::new_unchecked(f as *mut c_void) })
    }

    /// Address of an in-process plugin factory.
    pub fn from_plugin_factory(f: CreatePluginFn) -> Self {
        // SAFETY: function pointers are never null.
        Self(unsafe { NonNull::new_unchecked(f as *mut c_void) })
    }

    /// Address of an in-process teardown function.
    pub fn from_destroy(f: DestroyFn) -> Self {
        // SAFETY: function pointers are never null.
        Self(unsafe { NonNull::new_unchecked(f as *mut c_void) })
    }

    /// Reinterprets the address as a teardown function.
    ///
    /// # Safety
    ///
    /// The symbol must have been resolved under a teardown name and the
    /// library must still be mapped.
    pub unsafe fn as_destroy(&self) -> DestroyFn {
        unsafe { std::mem::transmute::<*const c_void, DestroyFn>(self.as_ptr()) }
    }

    /// Reinterprets the address as `CreateModule`.
    ///
    /// # Safety
    ///
    /// Same as [`RawSymbol::as_destroy`], for the module factory.
    pub unsafe fn as_module_factory(&self) -> CreateModuleFn {
        unsafe { std::mem::transmute::<*const c_void, CreateModuleFn>(self.as_ptr()) }
    }

    /// Reinterprets the address as `CreatePlugin`.
    ///
    /// # Safety
    ///
    /// Same as [`RawSymbol::as_destroy`], for the plugin factory.
    pub unsafe fn as_plugin_factory(&self) -> CreatePluginFn {
        unsafe { std::mem::transmute::<*const c_void, CreatePluginFn>(self.as_ptr()) }
    }
}
