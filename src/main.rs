//! dynhost: dynamic module and plugin host.
//!
//! Loads the configured modules and plugins at startup, runs them, and
//! unloads everything on shutdown.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use dynhost_core::config::AppConfig;
use dynhost_core::config::units::UnitConfig;
use dynhost_core::error::AppError;
use dynhost_unit::{ModuleManager, PluginManager, UnitKind, UnitManager};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Host error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config = match std::env::var("DYNHOST_CONFIG") {
        Ok(path) => AppConfig::load_from(&path)?,
        Err(_) => {
            let env = std::env::var("DYNHOST_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)?
        }
    };
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(config.logging.thread_ids)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(config.logging.thread_ids)
            .init();
    }
}

/// Main host run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting dynhost v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Load and run modules ─────────────────────────────
    let modules: Arc<ModuleManager> = Arc::new(ModuleManager::new());
    let module_count = start_units(Arc::clone(&modules), config.modules.clone()).await?;
    tracing::info!(count = module_count, "Modules started");

    // ── Step 2: Load and run plugins ─────────────────────────────
    let plugins: Arc<PluginManager> = Arc::new(PluginManager::new());
    let plugin_count = start_units(Arc::clone(&plugins), config.plugins.clone()).await?;
    tracing::info!(count = plugin_count, "Plugins started");

    let errors = dynhost_unit::module_interface().get_errors().len()
        + dynhost_unit::plugin_interface().get_errors().len();
    if errors > 0 {
        tracing::warn!(errors, "Some units failed to load");
    }

    // ── Step 3: Wait for shutdown ────────────────────────────────
    tracing::info!("dynhost running, press Ctrl+C to stop");
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, unloading units...");

    // ── Step 4: Unload in reverse order ──────────────────────────
    stop_units(plugins).await?;
    stop_units(modules).await?;

    tracing::info!("dynhost stopped");
    Ok(())
}

/// Loads (and optionally runs) every unit `config` names, off the async
/// runtime. Returns how many units are loaded afterwards.
async fn start_units<K: UnitKind>(
    manager: Arc<UnitManager<K>>,
    config: UnitConfig,
) -> Result<usize, AppError> {
    tokio::task::spawn_blocking(move || start_units_blocking(&manager, &config))
        .await
        .map_err(|e| AppError::internal(format!("Unit loader task failed: {}", e)))
}

fn start_units_blocking<K: UnitKind>(manager: &UnitManager<K>, config: &UnitConfig) -> usize {
    for name in &config.autoload {
        if let Err(e) = manager.load(name) {
            tracing::warn!(kind = K::LABEL, library = %name, error = %e, "Autoload failed");
        }
    }

    if config.auto_load {
        manager.load_dir(Path::new(&config.directory));
    }

    let loaded = manager.loaded_names();
    if config.run_on_load {
        for key in &loaded {
            let Some(unit) = manager.get(key) else {
                continue;
            };
            match unit.run() {
                Ok(()) => tracing::info!(kind = K::LABEL, library = %key, "Unit ran"),
                Err(e) => {
                    tracing::error!(kind = K::LABEL, library = %key, error = %e, "Unit run failed")
                }
            }
        }
    }

    loaded.len()
}

async fn stop_units<K: UnitKind>(manager: Arc<UnitManager<K>>) -> Result<(), AppError> {
    let unloaded = tokio::task::spawn_blocking(move || manager.unload_all())
        .await
        .map_err(|e| AppError::internal(format!("Unit unload task failed: {}", e)))?;
    tracing::info!(kind = K::LABEL, unloaded, "Units unloaded");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
