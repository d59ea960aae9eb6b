//! Unit inspection command.

use clap::Args;

use dynhost_core::error::AppError;
use dynhost_unit::{CapabilityMetadata, ModuleKind, PluginKind, UnitError, UnitKind, UnitManager};

use super::KindArg;
use crate::output::{self, OutputFormat};

/// Arguments for `inspect`
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Library name or path
    pub library: String,

    /// Unit kind the library exports
    #[arg(short, long, value_enum, default_value = "module")]
    pub kind: KindArg,
}

/// Execute `inspect`
pub async fn execute(args: &InspectArgs, format: OutputFormat) -> Result<(), AppError> {
    let library = args.library.clone();
    let meta = match args.kind {
        KindArg::Module => super::blocking(move || inspect::<ModuleKind>(&library)).await?,
        KindArg::Plugin => super::blocking(move || inspect::<PluginKind>(&library)).await?,
    };
    output::print_metadata(&args.library, &meta, format);
    Ok(())
}

/// Loads `library`, snapshots its metadata and unloads it again.
pub fn inspect<K: UnitKind>(library: &str) -> Result<CapabilityMetadata, AppError> {
    let manager: UnitManager<K> = UnitManager::new();
    let unit = manager.load(library)?;
    let meta = unit.metadata().ok_or_else(|| UnitError::Unloaded {
        name: library.to_string(),
    })?;
    manager.unload(&mut Some(unit));
    Ok(meta)
}
