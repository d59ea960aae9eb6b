//! CLI command definitions and dispatch.

pub mod config;
pub mod inspect;
pub mod run;
pub mod scan;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;
use dynhost_core::config::AppConfig;
use dynhost_core::error::AppError;

/// dynhost: dynamic module and plugin host
#[derive(Debug, Parser)]
#[command(name = "dynhost-cli", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (overrides the layered config/ files)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Environment overlay loaded from config/{env}.toml
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a library, print its metadata and unload it
    Inspect(inspect::InspectArgs),
    /// Load a library, run its unit and unload it
    Run(run::RunArgs),
    /// List the libraries in a directory and try loading each
    Scan(scan::ScanArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

/// Which unit ABI to load a library as
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// `CreateModule` / `DestroyModule`
    Module,
    /// `CreatePlugin` / `DestroyPlugin`
    Plugin,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        tracing::debug!(command = ?self.command, "Executing command");
        match &self.command {
            Commands::Inspect(args) => inspect::execute(args, self.format).await,
            Commands::Run(args) => run::execute(args).await,
            Commands::Scan(args) => scan::execute(args, self, self.format).await,
            Commands::Config(args) => config::execute(args, self, self.format).await,
        }
    }

    /// Load configuration from `--config`, or from the layered files for `--env`
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(&self.env),
        }
    }
}

/// Helper: run loader work on the blocking pool
pub async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::internal(format!("Loader task failed: {}", e)))?
}
