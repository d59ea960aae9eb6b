//! FFI surface shared by the host and unit libraries.

pub mod abi;
pub mod slot;

pub use abi::{
    CREATE_MODULE_SYMBOL, CREATE_PLUGIN_SYMBOL, CreateModuleFn, CreatePluginFn,
    DESTROY_MODULE_SYMBOL, DESTROY_PLUGIN_SYMBOL, DestroyFn, RawSymbol, UNIT_ABI,
};
pub use slot::InstanceSlot;
