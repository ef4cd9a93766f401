//! commitgrab - capture merge request commit lists from a browser tab.
//!
//! Main entry point for the commitgrab CLI.

mod cli;
mod cmd_capture;
mod cmd_config;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commitgrab_config::{commitgrab_dir, Config, ConfigLoader, ConfigValidator};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Console output goes to stderr so stdout carries only command output.
fn init_tracing(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("commitgrab")
        .filename_suffix("log")
        .max_log_files(14)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes buffered file output on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn default_config_path() -> PathBuf {
    commitgrab_dir().join("config.toml")
}

/// Log validation warnings; the first error aborts.
fn check_config(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config);
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if let Some(first) = result.errors.first() {
        return Err(format!(
            "invalid configuration in {}: {}: {}",
            path.display(),
            first.path,
            first.message
        )
        .into());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ConfigLoader::load_or_default(&config_path)?;

    init_tracing(&config.storage.log_dir)?;
    debug!("Using config {}", config_path.display());
    check_config(&config, &config_path)?;

    match cli.command {
        Commands::Capture {
            tab,
            endpoint,
            format,
            timeout_ms,
        } => cmd_capture::capture(config, tab, endpoint, format, timeout_ms).await,
        Commands::Tabs { endpoint } => cmd_capture::tabs(&config, endpoint).await,
        Commands::Parse { file, format } => cmd_capture::parse(&config, &file, format),
        Commands::Config { action } => cmd_config::handle_config_command(&config, action),
    }
}
