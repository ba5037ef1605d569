//! CarPlus CLI - stock and bookings for a mobile car-care business

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{appointment, backup, config, dashboard, logs, product, stats};

/// CarPlus - inventory and appointments in your terminal
#[derive(Parser)]
#[command(name = "carplus", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products in stock
    Product {
        #[command(subcommand)]
        command: product::ProductCommands,
    },

    /// Manage appointments
    #[command(alias = "appt")]
    Appointment {
        #[command(subcommand)]
        command: appointment::AppointmentCommands,
    },

    /// Show business totals
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Totals, top service and upcoming appointments
    Dashboard {
        /// Number of upcoming appointments to show
        #[arg(long, short = 'n')]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export or restore the JSON backup
    Backup {
        #[command(subcommand)]
        command: backup::BackupCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Product { .. } => "product",
            Commands::Appointment { .. } => "appointment",
            Commands::Stats { .. } => "stats",
            Commands::Dashboard { .. } => "dashboard",
            Commands::Backup { .. } => "backup",
            Commands::Logs { .. } => "logs",
            Commands::Config { .. } => "config",
        }
    }
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    let command = cli.command.name();

    let logger = commands::get_logger();
    commands::log_command(&logger, command);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_error(&logger, command, &e);
            let rejected = e
                .downcast_ref::<carplus_core::Error>()
                .is_some_and(|err| err.is_user_error());
            if rejected {
                output::error(&e.to_string());
                ExitCode::from(2)
            } else {
                tracing::error!(command, "command failed");
                output::error(&format!("{:#}", e));
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Product { command } => product::run(command),
        Commands::Appointment { command } => appointment::run(command),
        Commands::Stats { json } => stats::run(json),
        Commands::Dashboard { limit, json } => dashboard::run(limit, json),
        Commands::Backup { command } => backup::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}
