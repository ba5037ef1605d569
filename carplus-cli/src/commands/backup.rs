//! Backup command - JSON export and full-replace restore

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{confirm, get_context};
use crate::output::success;

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Write every product and appointment to a JSON file
    Export {
        /// Output file (defaults to the configured backup location)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Print the backup document to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace all data with the contents of a backup file
    Import {
        /// Backup file (defaults to the configured backup location)
        file: Option<PathBuf>,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: BackupCommands) -> Result<()> {
    match command {
        BackupCommands::Export {
            output,
            stdout,
            json,
        } => {
            let ctx = get_context()?;

            if stdout {
                let document = ctx.backup_service.export()?;
                println!("{}", serde_json::to_string_pretty(&document)?);
                return Ok(());
            }

            let file = ctx.backup_service.write_backup(output.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&file)?);
            } else {
                success("Backup written");
                println!("  Path: {}", file.path.display());
                println!("  Products: {}", file.products);
                println!("  Appointments: {}", file.appointments);
                println!("  Size: {}", file.size_display());
            }
        }
        BackupCommands::Import { file, force, json } => {
            let ctx = get_context()?;
            let source = file.unwrap_or_else(|| ctx.backup_service.import_source());

            if !json {
                println!(
                    "{}",
                    "Importing deletes every product and appointment first.".yellow()
                );
            }
            let prompt = format!("Restore from {}?", source.display());
            if !confirm(&prompt, force || json)? {
                return Ok(());
            }

            let result = ctx.backup_service.restore_backup(Some(source.as_path()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                success(&format!("Restored from {}", source.display()));
                println!(
                    "  Products: {} (replaced {})",
                    result.products, result.products_deleted
                );
                println!(
                    "  Appointments: {} (replaced {})",
                    result.appointments, result.appointments_deleted
                );
            }
        }
    }

    Ok(())
}
