//! Event log stored in logs.duckdb
//!
//! Records which commands ran and what failed. Product names, clients,
//! addresses and prices never go in here.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::log_migrations::{BOOTSTRAP_MIGRATION, LOG_MIGRATIONS};

/// Which front end wrote the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Mobile,
}

impl EntryPoint {
    fn label(self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Mobile => "mobile",
        }
    }
}

/// An event waiting to be written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Default::default()
        }
    }

    pub fn with_command(self, command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..self
        }
    }

    /// Attach an error message and, optionally, its causes
    pub fn with_error(self, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            error_details: details,
            ..self
        }
    }
}

/// A stored row of `sys_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    /// Unix milliseconds
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }
}

/// Summary of the log database
#[derive(Debug, Clone, Serialize)]
pub struct LogStats {
    pub total_entries: u64,
    pub error_count: u64,
    /// Unix milliseconds of the oldest and newest entry
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
    pub database_path: PathBuf,
    pub database_size_bytes: u64,
}

const SELECT_ENTRIES: &str = "SELECT id, timestamp, entry_point, app_version, platform, \
                              event, command, error_message, error_details FROM sys_logs";

fn entry_from_row(row: &Row) -> duckdb::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get("id")?,
        timestamp: row.get("timestamp")?,
        entry_point: row.get("entry_point")?,
        app_version: row.get("app_version")?,
        platform: row.get("platform")?,
        event: row.get("event")?,
        command: row.get("command")?,
        error_message: row.get("error_message")?,
        error_details: row.get("error_details")?,
    })
}

/// `outer: cause: root cause`, or None when the error has no source
fn cause_chain(error: &(dyn StdError + 'static)) -> Option<String> {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    if causes.is_empty() {
        None
    } else {
        Some(causes.join(": "))
    }
}

/// Writes and queries the event log
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
}

impl LoggingService {
    /// Open (or create) the log database and apply pending migrations
    pub fn new(
        db_path: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let service = Self {
            conn: Mutex::new(Connection::open(db_path)?),
            db_path: db_path.to_path_buf(),
            entry_point,
            app_version: app_version.into(),
        };
        service.migrate()?;
        Ok(service)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| anyhow!("Log database lock poisoned: {}", e))
    }

    /// The bootstrap script is idempotent; the rest run once each
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;

        for (name, sql) in LOG_MIGRATIONS {
            if *name == BOOTSTRAP_MIGRATION {
                conn.execute_batch(sql)?;
                continue;
            }

            let applied: bool = conn.query_row(
                "SELECT COUNT(*) > 0 FROM sys_migrations WHERE migration_name = ?",
                [name],
                |row| row.get(0),
            )?;
            if applied {
                continue;
            }

            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO sys_migrations (migration_name) VALUES (?)",
                [name],
            )?;
        }

        Ok(())
    }

    /// Write an event stamped with entry point, version and platform
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sys_logs (timestamp, entry_point, app_version, platform,
                                   event, command, error_message, error_details)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                Utc::now().timestamp_millis(),
                self.entry_point.label(),
                self.app_version,
                std::env::consts::OS,
                event.event,
                event.command,
                event.error_message,
                event.error_details,
            ],
        )?;
        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Record that a CLI command started
    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new("command_executed").with_command(command))
    }

    /// Record a failed command; the error's causes go into `error_details`
    pub fn log_error(&self, command: &str, error: &(dyn StdError + 'static)) -> Result<()> {
        self.log(
            LogEvent::new("command_failed")
                .with_command(command)
                .with_error(error.to_string(), cause_chain(error)),
        )
    }

    /// Newest first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.select("", limit)
    }

    /// Newest failures first
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.select("WHERE error_message IS NOT NULL", limit)
    }

    fn select(&self, filter: &str, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} {} ORDER BY timestamp DESC, id DESC LIMIT {}",
            SELECT_ENTRIES, filter, limit
        ))?;
        let rows = stmt.query_map([], entry_from_row)?;
        Ok(rows.collect::<duckdb::Result<Vec<_>>>()?)
    }

    fn count_where(&self, filter: &str) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM sys_logs {}", filter),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn count(&self) -> Result<u64> {
        self.count_where("")
    }

    pub fn count_errors(&self) -> Result<u64> {
        self.count_where("WHERE error_message IS NOT NULL")
    }

    /// Remove entries written before `timestamp_ms`
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn stats(&self) -> Result<LogStats> {
        let (oldest, newest) = {
            let conn = self.lock()?;
            conn.query_row("SELECT MIN(timestamp), MAX(timestamp) FROM sys_logs", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
        };

        Ok(LogStats {
            total_entries: self.count()?,
            error_count: self.count_errors()?,
            oldest,
            newest,
            database_path: self.db_path.clone(),
            database_size_bytes: std::fs::metadata(&self.db_path)
                .map(|m| m.len())
                .unwrap_or(0),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_in(dir: &TempDir) -> LoggingService {
        LoggingService::new(&dir.path().join("logs.duckdb"), EntryPoint::Cli, "0.1.0").unwrap()
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "backup import failed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_new_creates_file_and_is_reopenable() {
        let dir = TempDir::new().unwrap();
        {
            let logger = open_in(&dir);
            assert!(logger.db_path().exists());
            logger.log_event("first_run").unwrap();
        }

        let logger = open_in(&dir);
        assert_eq!(logger.count().unwrap(), 1);
    }

    #[test]
    fn test_log_command_is_stamped() {
        let dir = TempDir::new().unwrap();
        let logger = open_in(&dir);

        logger.log_command("product").unwrap();

        let recent = logger.get_recent(5).unwrap();
        assert_eq!(recent.len(), 1);
        let entry = &recent[0];
        assert_eq!(entry.event, "command_executed");
        assert_eq!(entry.command.as_deref(), Some("product"));
        assert_eq!(entry.entry_point, "cli");
        assert_eq!(entry.app_version, "0.1.0");
        assert_eq!(entry.platform, std::env::consts::OS);
        assert!(!entry.is_error());
    }

    #[test]
    fn test_log_error_keeps_cause_chain() {
        let dir = TempDir::new().unwrap();
        let logger = open_in(&dir);

        logger.log_command("backup").unwrap();
        let err = Wrapped(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"));
        logger.log_error("backup", &err).unwrap();

        let failures = logger.get_errors(5).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error_message.as_deref(), Some("backup import failed"));
        assert_eq!(failures[0].error_details.as_deref(), Some("no such file"));
        assert_eq!(logger.count_errors().unwrap(), 1);
        assert_eq!(logger.count().unwrap(), 2);
    }

    #[test]
    fn test_delete_before_and_stats() {
        let dir = TempDir::new().unwrap();
        let logger = open_in(&dir);

        let empty = logger.stats().unwrap();
        assert_eq!(empty.total_entries, 0);
        assert_eq!(empty.oldest, None);

        logger.log_event("dashboard_opened").unwrap();
        logger.log_event("stats_opened").unwrap();

        let stats = logger.stats().unwrap();
        assert_eq!(stats.total_entries, 2);
        assert!(stats.oldest <= stats.newest);

        assert_eq!(logger.delete_before(0).unwrap(), 0);
        let future = Utc::now().timestamp_millis() + 60_000;
        assert_eq!(logger.delete_before(future).unwrap(), 2);
        assert_eq!(logger.count().unwrap(), 0);
    }
}
