//! # dynhost-core
//!
//! Core crate for dynhost. Contains the configuration schemas and the
//! unified error system shared by the loader, the host binary and the CLI.
//!
//! This crate has **no** internal dependencies on other dynhost crates.

pub mod config;
pub mod error;

pub use error::{AppError, AppResult, ErrorKind};
