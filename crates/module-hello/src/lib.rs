//! Sample dynhost module.
//!
//! Build with `cargo build -p module-hello` and load the resulting
//! `libmodule_hello` shared library with `ModuleManager::load`.

use std::sync::atomic::{AtomicU64, Ordering};

use dynhost_sdk::prelude::*;

const INFO: UnitInfo = unit_info!("hello").with_code_name("1001");

/// Module that prints a greeting each time it runs.
#[derive(Debug)]
pub struct HelloModule {
    greeting: String,
    runs: AtomicU64,
}

impl HelloModule {
    /// Creates a module printing `greeting`.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            greeting: greeting.into(),
            runs: AtomicU64::new(0),
        }
    }

    /// The greeting text.
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// How many times `run` has been called.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    fn greet(&self) -> Result<(), String> {
        if self.greeting.trim().is_empty() {
            return Err("greeting is empty".to_string());
        }
        let run = self.runs.fetch_add(1, Ordering::Relaxed) + 1;
        println!("[hello #{run}] {}", self.greeting);
        Ok(())
    }
}

impl Default for HelloModule {
    fn default() -> Self {
        Self::new("Hello from a dynhost module")
    }
}

impl_capability!(HelloModule, INFO, |this| this.greet());

impl Module for HelloModule {
    fn module_type(&self) -> ModuleType {
        ModuleType::Default
    }
}

export_module!(HelloModule);
