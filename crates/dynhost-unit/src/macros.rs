//! Export macros for unit libraries.

/// Exports a [`Module`](crate::unit::Module) implementation from a
/// `cdylib`.
///
/// Generates `CreateModule` and `DestroyModule`. The library holds one
/// instance at a time: repeated `CreateModule` calls return the same
/// object until `DestroyModule` drops it.
///
/// # Example
/// ```rust,ignore
/// #[derive(Default)]
/// struct Hello;
/// // impl Capability + Module for Hello ...
///
/// dynhost_unit::export_module!(Hello);
/// // or with an explicit constructor:
/// dynhost_unit::export_module!(Hello, Hello::with_greeting("hi"));
/// ```
#[macro_export]
macro_rules! export_module {
    ($ty:ty) => {
        $crate::export_module!($ty, <$ty as ::core::default::Default>::default());
    };
    ($ty:ty, $ctor:expr) => {
        static __DYNHOST_MODULE_INSTANCE: $crate::ffi::InstanceSlot<dyn $crate::unit::Module> =
            $crate::ffi::InstanceSlot::new();

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub extern "C-unwind" fn CreateModule() -> *mut dyn $crate::unit::Module {
            __DYNHOST_MODULE_INSTANCE
                .get_or_create(|| {
                    let unit: ::std::boxed::Box<dyn $crate::unit::Module> =
                        ::std::boxed::Box::<$ty>::new($ctor);
                    unit
                })
                .as_ptr()
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub extern "C-unwind" fn DestroyModule() {
            __DYNHOST_MODULE_INSTANCE.destroy();
        }
    };
}

/// Exports a [`Plugin`](crate::unit::Plugin) implementation from a
/// `cdylib`.
///
/// Same shape as [`export_module!`], generating `CreatePlugin` and
/// `DestroyPlugin`.
#[macro_export]
macro_rules! export_plugin {
    ($ty:ty) => {
        $crate::export_plugin!($ty, <$ty as ::core::default::Default>::default());
    };
    ($ty:ty, $ctor:expr) => {
        static __DYNHOST_PLUGIN_INSTANCE: $crate::ffi::InstanceSlot<dyn $crate::unit::Plugin> =
            $crate::ffi::InstanceSlot::new();

        #[unsafe(no_mangle)]
        #[allow(non_snake_case, improper_ctypes_definitions)]
        pub extern "C-unwind" fn CreatePlugin() -> *mut dyn $crate::unit::Plugin {
            __DYNHOST_PLUGIN_INSTANCE
                .get_or_create(|| {
                    let unit: ::std::boxed::Box<dyn $crate::unit::Plugin> =
                        ::std::boxed::Box::<$ty>::new($ctor);
                    unit
                })
                .as_ptr()
        }

        #[unsafe(no_mangle)]
        #[allow(non_snake_case)]
        pub extern "C-unwind" fn DestroyPlugin() {
            __DYNHOST_PLUGIN_INSTANCE.destroy();
        }
    };
}
