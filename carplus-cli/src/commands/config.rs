//! Config command - show and change settings.json

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;

use super::get_config;
use crate::output::success;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show resolved paths and settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the preferred (external) backup file
    SetBackupPath { path: PathBuf },
    /// Set the backup file used when the external one is unavailable
    SetFallbackPath { path: PathBuf },
    /// Set how many upcoming appointments the dashboard shows
    SetUpcomingLimit { limit: usize },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let mut config = get_config()?;

    match command {
        ConfigCommands::Show { json } => {
            let export_target = config.export_target();
            let import_source = config.import_source();

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "data_dir": config.data_dir,
                        "db_path": config.db_path,
                        "log_db_path": config.log_db_path,
                        "external_backup_path": config.external_backup_path,
                        "fallback_backup_path": config.fallback_backup_path,
                        "export_target": export_target,
                        "import_source": import_source,
                        "upcoming_limit": config.upcoming_limit,
                    })
                );
                return Ok(());
            }

            let external = config
                .external_backup_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());

            println!("{}", "CarPlus Settings".bold());
            println!("  Data directory:   {}", config.data_dir.display());
            println!("  Database:         {}", config.db_path.display());
            println!("  Event log:        {}", config.log_db_path.display());
            println!("  External backup:  {}", external);
            println!("  Fallback backup:  {}", config.fallback_backup_path.display());
            println!("  Next export to:   {}", export_target.display());
            println!("  Next import from: {}", import_source.display());
            println!("  Upcoming limit:   {}", config.upcoming_limit);
            return Ok(());
        }
        ConfigCommands::SetBackupPath { path } => {
            config.external_backup_path = Some(path);
        }
        ConfigCommands::SetFallbackPath { path } => {
            config.fallback_backup_path = path;
        }
        ConfigCommands::SetUpcomingLimit { limit } => {
            if limit == 0 {
                bail!("Upcoming limit must be at least 1");
            }
            config.upcoming_limit = limit;
        }
    }

    config.save()?;
    success("Settings saved");
    Ok(())
}
