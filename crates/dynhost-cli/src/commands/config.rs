//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use super::Cli;
use crate::output::{self, OutputFormat};
use dynhost_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate,
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, cli: &Cli, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = cli.load_config()?;
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => {
            let checked = cli.load_config().and_then(|config| {
                config.validate()?;
                Ok(config)
            });
            match checked {
                Ok(config) => {
                    output::print_success(&format!("Configuration '{}' is valid", source(cli)));
                    output::print_kv("Modules", &config.modules.directory);
                    output::print_kv("Plugins", &config.plugins.directory);
                    output::print_kv(
                        "Logging",
                        &format!("{} ({})", config.logging.level, config.logging.format),
                    );
                }
                Err(e) => {
                    output::print_error(&format!("Configuration invalid: {}", e));
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

/// Human-readable name of where the configuration came from
fn source(cli: &Cli) -> String {
    match &cli.config {
        Some(path) => path.clone(),
        None => format!("config/default + config/{}", cli.env),
    }
}
