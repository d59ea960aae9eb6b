//! # dynhost-sdk
//!
//! SDK for writing dynhost modules and plugins.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dynhost_sdk::prelude::*;
//!
//! const INFO: UnitInfo = unit_info!("hello").with_code_name("1001");
//!
//! #[derive(Default)]
//! struct Hello;
//!
//! impl_capability!(Hello, INFO, |_this| {
//!     println!("hello from a module");
//!     Ok(())
//! });
//!
//! impl Module for Hello {
//!     fn module_type(&self) -> ModuleType {
//!         ModuleType::Default
//!     }
//! }
//!
//! export_module!(Hello);
//! ```
//!
//! Build the crate as a `cdylib` with the same toolchain as the host.

pub mod info;

pub use dynhost_unit::ffi::UNIT_ABI;
pub use info::UnitInfo;

/// Prelude for convenient imports.
pub mod prelude {
    pub use dynhost_unit::prelude::*;

    pub use crate::info::UnitInfo;
    pub use crate::{impl_capability, unit_info};
}
