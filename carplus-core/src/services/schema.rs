//! Schema service - creates tables and applies additive column upgrades
//!
//! Table scripts are idempotent (IF NOT EXISTS). Column upgrades are
//! best-effort: each one runs on its own and a failure is reported, never
//! propagated, so one stubborn column can't keep the app from starting.

use duckdb::Connection;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::result::Result;
use crate::migrations::{ColumnUpgrade, COLUMN_UPGRADES, TABLE_SCRIPTS};

/// Outcome of [`SchemaService::ensure_schema`]
#[derive(Debug, Default, Serialize)]
pub struct SchemaReport {
    /// `table.column` entries added during this run
    pub columns_added: Vec<String>,
    /// `table.column` entries that were missing and could not be added
    pub columns_failed: Vec<String>,
}

/// Service for creating and upgrading the database schema
pub struct SchemaService<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Bring the schema up to date
    ///
    /// 1. Runs every table script (creates sequences and tables if absent)
    /// 2. Adds any column from [`COLUMN_UPGRADES`] missing from an older table
    pub fn ensure_schema(&self) -> Result<SchemaReport> {
        for (name, sql) in TABLE_SCRIPTS {
            debug!(script = name, "applying table script");
            self.conn.execute_batch(sql)?;
        }

        let mut report = SchemaReport::default();
        for upgrade in COLUMN_UPGRADES {
            let label = format!("{}.{}", upgrade.table, upgrade.column);
            match self.apply_upgrade(upgrade) {
                Ok(true) => report.columns_added.push(label),
                Ok(false) => {}
                Err(e) => {
                    warn!(column = %label, error = %e, "could not add column, continuing without it");
                    report.columns_failed.push(label);
                }
            }
        }

        Ok(report)
    }

    /// Add the column if it's missing. Returns true if it was added.
    fn apply_upgrade(&self, upgrade: &ColumnUpgrade) -> Result<bool> {
        let columns = self.table_columns(upgrade.table)?;
        if columns.iter().any(|c| c.eq_ignore_ascii_case(upgrade.column)) {
            return Ok(false);
        }

        self.conn.execute_batch(&upgrade.alter_sql())?;
        debug!(table = upgrade.table, column = upgrade.column, "column added");
        Ok(true)
    }

    /// Column names of a table, in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT column_name FROM information_schema.columns
             WHERE table_name = ?
             ORDER BY ordinal_position",
        )?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duckdb::Connection;

    #[test]
    fn test_schema_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let service = SchemaService::new(&conn);

        let report = service.ensure_schema().unwrap();

        // Fresh tables already carry every column
        assert!(report.columns_added.is_empty());
        assert!(report.columns_failed.is_empty());
        assert_eq!(
            service.table_columns("products").unwrap(),
            vec!["id", "name", "qty", "unit_price", "threshold"]
        );

        // Running again is a no-op
        let report = service.ensure_schema().unwrap();
        assert!(report.columns_added.is_empty());
    }

    #[test]
    fn test_adds_missing_columns_to_legacy_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE SEQUENCE appointments_id_seq START 1;
             CREATE TABLE appointments (
                 id BIGINT PRIMARY KEY DEFAULT nextval('appointments_id_seq'),
                 client VARCHAR, address VARCHAR, datetime VARCHAR, service VARCHAR
             );
             INSERT INTO appointments (client, datetime) VALUES ('Rossi', '2024-05-01 10:00');",
        )
        .unwrap();

        let service = SchemaService::new(&conn);
        let report = service.ensure_schema().unwrap();

        assert_eq!(
            report.columns_added,
            vec!["appointments.price", "appointments.consumption"]
        );

        // Existing rows pick up the defaults
        let (price, consumption): (f64, String) = conn
            .query_row(
                "SELECT price, consumption FROM appointments WHERE client = 'Rossi'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(price, 0.0);
        assert_eq!(consumption, "");
    }

    #[test]
    fn test_missing_table_is_reported_not_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        let service = SchemaService::new(&conn);

        let upgrade = ColumnUpgrade {
            table: "no_such_table",
            column: "price",
            sql_type: "DOUBLE",
            default: "0",
        };
        // Missing table looks like "no columns", so the ALTER fails
        assert!(service.apply_upgrade(&upgrade).is_err());
    }
}
