//! Directory scan command.

use std::path::{Path, PathBuf};

use clap::Args;

use dynhost_core::error::AppError;
use dynhost_unit::discovery;
use dynhost_unit::{ModuleKind, PluginKind, UnitKind, UnitManager};

use super::{Cli, KindArg};
use crate::output::{self, OutputFormat, UnitRow};

/// Arguments for `scan`
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the configured directory for the kind)
    pub dir: Option<PathBuf>,

    /// Unit kind the libraries export
    #[arg(short, long, value_enum, default_value = "module")]
    pub kind: KindArg,
}

/// Execute `scan`
pub async fn execute(args: &ScanArgs, cli: &Cli, format: OutputFormat) -> Result<(), AppError> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => {
            let config = cli.load_config()?;
            let units = match args.kind {
                KindArg::Module => config.modules,
                KindArg::Plugin => config.plugins,
            };
            PathBuf::from(units.directory)
        }
    };

    if !dir.is_dir() {
        return Err(AppError::not_found(format!(
            "Directory '{}' does not exist",
            dir.display()
        )));
    }

    let scan_dir = dir.clone();
    let rows = match args.kind {
        KindArg::Module => super::blocking(move || Ok(scan::<ModuleKind>(&scan_dir))).await?,
        KindArg::Plugin => super::blocking(move || Ok(scan::<PluginKind>(&scan_dir))).await?,
    };

    output::print_list(&rows, format);
    let failed = rows.iter().filter(|row| !row.is_ok()).count();
    if failed > 0 && format == OutputFormat::Table {
        output::print_warning(&format!(
            "{} of {} libraries in '{}' failed to load",
            failed,
            rows.len(),
            dir.display()
        ));
    }
    Ok(())
}

/// Tries every library in `dir`, then unloads whatever loaded.
pub fn scan<K: UnitKind>(dir: &Path) -> Vec<UnitRow> {
    let manager: UnitManager<K> = UnitManager::new();
    let rows = discovery::discover(dir)
        .into_iter()
        .map(|path| {
            let key = path.to_string_lossy().into_owned();
            match manager.load(&key) {
                Ok(unit) => match unit.metadata() {
                    Some(meta) => UnitRow::loaded(&key, &meta),
                    None => UnitRow::failed(&key, "unloaded during scan"),
                },
                Err(e) => UnitRow::failed(&key, e),
            }
        })
        .collect();
    manager.unload_all();
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_reports_unloadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join(discovery::library_file_name("broken"));
        std::fs::write(&fake, b"not a shared library").unwrap();

        let rows = scan::<ModuleKind>(dir.path());
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_ok());
        assert!(rows[0].status.contains("could not load library"));
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan::<PluginKind>(dir.path()).is_empty());
    }
}
