//! Logs command - inspect and prune logs.duckdb

use anyhow::Result;
use chrono::{Duration, Local, TimeZone};
use clap::Subcommand;
use colored::Colorize;

use super::{confirm, get_config};
use crate::output::{create_table, success};
use carplus_core::services::{EntryPoint, LogEntry, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show the newest events
    List {
        /// How many entries to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Only failed commands
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete events older than a number of days
    Clear {
        #[arg(long, default_value = "30")]
        days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Entry counts, time span and file size
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let config = get_config()?;
    let logger = LoggingService::new(
        &config.log_db_path,
        EntryPoint::Cli,
        env!("CARGO_PKG_VERSION"),
    )?;

    match command {
        LogsCommands::List {
            limit,
            errors,
            json,
        } => list(&logger, limit, errors, json),
        LogsCommands::Clear { days, force, json } => clear(&logger, days, force, json),
        LogsCommands::Stats { json } => stats(&logger, json),
    }
}

fn local_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        None => "?".to_string(),
    }
}

fn list(logger: &LoggingService, limit: usize, errors: bool, json: bool) -> Result<()> {
    let entries: Vec<LogEntry> = if errors {
        logger.get_errors(limit)?
    } else {
        logger.get_recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("The event log is empty.");
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["When", "Event", "Command", "Version", "Failure"]);
    for entry in entries {
        let failure = match (&entry.error_message, &entry.error_details) {
            (Some(message), Some(details)) => format!("{} ({})", message, details).red().to_string(),
            (Some(message), None) => message.red().to_string(),
            _ => String::new(),
        };
        table.add_row(vec![
            local_time(entry.timestamp),
            entry.event,
            entry.command.unwrap_or_else(|| "-".to_string()),
            entry.app_version,
            failure,
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(logger: &LoggingService, days: u32, force: bool, json: bool) -> Result<()> {
    let cutoff = chrono::Utc::now() - Duration::days(i64::from(days));

    let prompt = format!("Remove events recorded before {}?", cutoff.format("%d/%m/%Y"));
    if !confirm(&prompt, force || json)? {
        return Ok(());
    }

    let removed = logger.delete_before(cutoff.timestamp_millis())?;
    if json {
        println!("{}", serde_json::json!({ "deleted": removed }));
    } else {
        success(&format!("Removed {} event(s)", removed));
    }
    Ok(())
}

fn stats(logger: &LoggingService, json: bool) -> Result<()> {
    let stats = logger.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let span = match (stats.oldest, stats.newest) {
        (Some(oldest), Some(newest)) => format!("{} .. {}", local_time(oldest), local_time(newest)),
        _ => "-".to_string(),
    };

    println!("{}", "Event Log".bold());
    println!("  Entries:  {}", stats.total_entries);
    println!("  Failures: {}", stats.error_count);
    println!("  Span:     {}", span);
    println!("  File:     {}", stats.database_path.display());
    println!("  Size:     {:.1} KB", stats.database_size_bytes as f64 / 1024.0);
    Ok(())
}
