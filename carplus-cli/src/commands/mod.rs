//! CLI command implementations

pub mod appointment;
pub mod backup;
pub mod config;
pub mod dashboard;
pub mod logs;
pub mod product;
pub mod stats;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dialoguer::Confirm;

use carplus_core::config::Config;
use carplus_core::services::{EntryPoint, LogEvent, LoggingService};
use carplus_core::CarplusContext;

/// `$CARPLUS_DIR`, else `~/.carplus`
pub fn get_data_dir() -> Result<PathBuf> {
    Config::default_data_dir().ok_or_else(|| anyhow!("Could not find home directory"))
}

pub fn get_config() -> Result<Config> {
    let data_dir = get_data_dir()?;
    Config::load(&data_dir)
}

/// Open the database and bring its schema up to date
pub fn get_context() -> Result<CarplusContext> {
    let config = get_config()?;
    let data_dir = config.data_dir.clone();

    let ctx = CarplusContext::new(config)
        .with_context(|| format!("Failed to open CarPlus data in {}", data_dir.display()))?;

    for failed in &ctx.schema_report.columns_failed {
        tracing::warn!(column = %failed, "schema upgrade failed");
    }
    Ok(ctx)
}

/// The event log, or None when it can't be opened
pub fn get_logger() -> Option<LoggingService> {
    let config = get_config().ok()?;
    std::fs::create_dir_all(&config.data_dir).ok()?;
    LoggingService::new(&config.log_db_path, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            tracing::debug!(error = %e, "event log write failed");
        }
    }
}

pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    log_event(logger, LogEvent::new("command_executed").with_command(command));
}

pub fn log_error(logger: &Option<LoggingService>, command: &str, error: &anyhow::Error) {
    if let Some(l) = logger {
        if let Err(e) = l.log_error(command, &**error) {
            tracing::debug!(error = %e, "event log write failed");
        }
    }
}

/// Ask before a destructive action; `true` when the user agreed or `force` was given
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    let agreed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    if !agreed {
        println!("Cancelled.");
    }
    Ok(agreed)
}
