//! Unit run command.

use clap::Args;

use dynhost_core::error::AppError;
use dynhost_unit::{ModuleKind, PluginKind, UnitKind, UnitManager, UnloadOutcome};

use super::KindArg;
use crate::output;

/// Arguments for `run`
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Library name or path
    pub library: String,

    /// Unit kind the library exports
    #[arg(short, long, value_enum, default_value = "module")]
    pub kind: KindArg,
}

/// Execute `run`
pub async fn execute(args: &RunArgs) -> Result<(), AppError> {
    let library = args.library.clone();
    let outcome = match args.kind {
        KindArg::Module => super::blocking(move || run_once::<ModuleKind>(&library)).await?,
        KindArg::Plugin => super::blocking(move || run_once::<PluginKind>(&library)).await?,
    };

    output::print_success(&format!("'{}' ran", args.library));
    if outcome == (UnloadOutcome::Unloaded { destroyed: false }) {
        output::print_warning("library has no teardown export; its instance was not destroyed");
    }
    Ok(())
}

/// Loads `library`, runs its unit once and unloads it, also when the run
/// fails.
pub fn run_once<K: UnitKind>(library: &str) -> Result<UnloadOutcome, AppError> {
    let manager: UnitManager<K> = UnitManager::new();
    let unit = manager.load(library)?;
    let ran = unit.run();
    let outcome = manager.unload(&mut Some(unit));
    ran?;
    Ok(outcome)
}
