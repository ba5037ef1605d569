//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use duckdb::{params, Connection};
use tracing::warn;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Appointment, AppointmentInput, BackupAppointment, BackupProduct, Product, ProductInput,
};
use crate::services::{SchemaReport, SchemaService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

const PRODUCT_COLUMNS: &str = "id, name, qty, unit_price, threshold";

const APPOINTMENT_COLUMNS: &str = "id, client, address, datetime, service, price, consumption";

/// Chronological ordering on the stored text; unparseable rows sort last
const APPOINTMENT_ORDER: &str =
    "ORDER BY try_strptime(datetime, '%Y-%m-%d %H:%M') ASC NULLS LAST, id ASC";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// Check if an error is DuckDB rejecting a duplicate value in a UNIQUE column
fn is_unique_violation(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("duplicate key") || lower.contains("unique constraint")
}

/// DuckDB repository implementation
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database file
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which can occur when a second CLI invocation starts while another one
    /// still holds the file.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            error = %err_msg,
                            "database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.map(Error::from).unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading is disabled; nothing here needs extensions and
        // cached ones in ~/.duckdb/extensions can fail code signing on macOS.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::database(format!("Lock poisoned: {}", e)))
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create missing tables and add missing columns
    pub fn ensure_schema(&self) -> Result<SchemaReport> {
        let conn = self.lock()?;
        SchemaService::new(&conn).ensure_schema()
    }

    // === Product operations ===

    /// Products ordered by name, optionally filtered by a case-insensitive substring
    pub fn get_products(&self, filter: Option<&str>) -> Result<Vec<Product>> {
        let conn = self.lock()?;

        let products = match filter {
            Some(needle) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM products WHERE contains(lower(name), ?) ORDER BY name",
                    PRODUCT_COLUMNS
                ))?;
                let rows = stmt.query_map([needle.to_lowercase()], row_to_product)?;
                rows.collect::<duckdb::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM products ORDER BY name",
                    PRODUCT_COLUMNS
                ))?;
                let rows = stmt.query_map([], row_to_product)?;
                rows.collect::<duckdb::Result<Vec<_>>>()?
            }
        };

        Ok(products)
    }

    /// Products in storage (id) order, as written to backups
    pub fn get_products_in_storage_order(&self) -> Result<Vec<Product>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM products ORDER BY id",
            PRODUCT_COLUMNS
        ))?;
        let products = stmt
            .query_map([], row_to_product)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(products)
    }

    pub fn get_product_by_id(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS),
            [id],
            row_to_product,
        );

        match result {
            Ok(product) => Ok(Some(product)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether another row already uses this exact name
    fn product_name_taken(conn: &Connection, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM products WHERE name = ? AND id <> COALESCE(?, -1)",
            params![name, exclude_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert a product and return its generated id
    pub fn insert_product(&self, input: &ProductInput) -> Result<i64> {
        let conn = self.lock()?;

        if Self::product_name_taken(&conn, &input.name, None)? {
            return Err(Error::DuplicateName(input.name.clone()));
        }

        conn.query_row(
            "INSERT INTO products (name, qty, unit_price, threshold)
             VALUES (?, ?, ?, ?)
             RETURNING id",
            params![input.name, input.qty, input.unit_price, input.threshold],
            |row| row.get(0),
        )
        .map_err(|e| map_unique_violation(e, &input.name))
    }

    /// Overwrite every field of a product
    pub fn update_product(&self, id: i64, input: &ProductInput) -> Result<()> {
        let conn = self.lock()?;

        let current_name: Option<String> = match conn.query_row(
            "SELECT name FROM products WHERE id = ?",
            [id],
            |row| row.get(0),
        ) {
            Ok(name) => name,
            Err(duckdb::Error::QueryReturnedNoRows) => {
                return Err(Error::not_found(format!("Product {}", id)))
            }
            Err(e) => return Err(e.into()),
        };

        if current_name.as_deref() == Some(input.name.as_str()) {
            // Leave the UNIQUE column alone when it doesn't change
            conn.execute(
                "UPDATE products SET qty = ?, unit_price = ?, threshold = ? WHERE id = ?",
                params![input.qty, input.unit_price, input.threshold, id],
            )?;
            return Ok(());
        }

        if Self::product_name_taken(&conn, &input.name, Some(id))? {
            return Err(Error::DuplicateName(input.name.clone()));
        }

        conn.execute(
            "UPDATE products SET name = ?, qty = ?, unit_price = ?, threshold = ? WHERE id = ?",
            params![input.name, input.qty, input.unit_price, input.threshold, id],
        )
        .map_err(|e| map_unique_violation(e, &input.name))?;

        Ok(())
    }

    /// Delete a product. Returns the number of rows removed (0 or 1).
    pub fn delete_product(&self, id: i64) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM products WHERE id = ?", [id])?;
        Ok(deleted)
    }

    /// Subtract `amount` from the first product whose name matches case-insensitively
    ///
    /// Returns false when no product matches. Stock is allowed to go negative.
    pub fn decrement_stock(&self, name: &str, amount: f64) -> Result<bool> {
        let conn = self.lock()?;

        let id: i64 = match conn.query_row(
            "SELECT id FROM products WHERE lower(name) = lower(?) ORDER BY id LIMIT 1",
            [name],
            |row| row.get(0),
        ) {
            Ok(id) => id,
            Err(duckdb::Error::QueryReturnedNoRows) => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        conn.execute(
            "UPDATE products SET qty = COALESCE(qty, 0) - ? WHERE id = ?",
            params![amount, id],
        )?;

        Ok(true)
    }

    pub fn get_product_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Appointment operations ===

    /// Appointments in chronological order, optionally filtered on client or address
    pub fn get_appointments(&self, filter: Option<&str>) -> Result<Vec<Appointment>> {
        let conn = self.lock()?;

        let appointments = match filter {
            Some(needle) => {
                let needle = needle.to_lowercase();
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM appointments
                     WHERE contains(lower(client), ?) OR contains(lower(address), ?)
                     {}",
                    APPOINTMENT_COLUMNS, APPOINTMENT_ORDER
                ))?;
                let rows = stmt.query_map(params![needle, needle], row_to_appointment)?;
                rows.collect::<duckdb::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM appointments {}",
                    APPOINTMENT_COLUMNS, APPOINTMENT_ORDER
                ))?;
                let rows = stmt.query_map([], row_to_appointment)?;
                rows.collect::<duckdb::Result<Vec<_>>>()?
            }
        };

        Ok(appointments)
    }

    /// Appointments at or after `from`, soonest first
    pub fn get_upcoming_appointments(
        &self,
        from: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<Appointment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM appointments
             WHERE try_strptime(datetime, '%Y-%m-%d %H:%M') >= CAST(? AS TIMESTAMP)
             {}
             LIMIT {}",
            APPOINTMENT_COLUMNS, APPOINTMENT_ORDER, limit
        ))?;

        let from = from.format("%Y-%m-%d %H:%M:%S").to_string();
        let appointments = stmt
            .query_map([from], row_to_appointment)?
            .collect::<duckdb::Result<Vec<_>>>()?;

        Ok(appointments)
    }

    /// Appointments in storage (id) order, as written to backups
    pub fn get_appointments_in_storage_order(&self) -> Result<Vec<Appointment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM appointments ORDER BY id",
            APPOINTMENT_COLUMNS
        ))?;
        let appointments = stmt
            .query_map([], row_to_appointment)?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(appointments)
    }

    pub fn get_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM appointments WHERE id = ?", APPOINTMENT_COLUMNS),
            [id],
            row_to_appointment,
        );

        match result {
            Ok(appointment) => Ok(Some(appointment)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert an appointment and return its generated id
    pub fn insert_appointment(&self, input: &AppointmentInput) -> Result<i64> {
        let conn = self.lock()?;
        let id = conn.query_row(
            "INSERT INTO appointments (client, address, datetime, service, price, consumption)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
            params![
                input.client,
                input.address,
                input.datetime,
                input.service,
                input.price,
                input.consumption,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Overwrite every field of an appointment. Returns rows changed (0 or 1).
    pub fn update_appointment(&self, id: i64, input: &AppointmentInput) -> Result<usize> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE appointments
             SET client = ?, address = ?, datetime = ?, service = ?, price = ?, consumption = ?
             WHERE id = ?",
            params![
                input.client,
                input.address,
                input.datetime,
                input.service,
                input.price,
                input.consumption,
                id,
            ],
        )?;
        Ok(updated)
    }

    pub fn delete_appointment(&self, id: i64) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(deleted)
    }

    // === Aggregates ===

    /// Appointment count and revenue (NULL prices count as zero)
    pub fn get_appointment_totals(&self) -> Result<(i64, f64)> {
        let conn = self.lock()?;
        let totals = conn.query_row(
            "SELECT COUNT(*), CAST(COALESCE(SUM(price), 0) AS DOUBLE) FROM appointments",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }

    /// Most booked service; ties resolve to the alphabetically smallest name
    pub fn get_top_service(&self) -> Result<Option<(String, i64)>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT COALESCE(service, '') AS svc, COUNT(*) AS cnt
             FROM appointments
             GROUP BY svc
             ORDER BY cnt DESC, svc ASC
             LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );

        match result {
            Ok(top) => Ok(Some(top)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // === Backup support ===

    /// Remove every product and appointment
    ///
    /// Each statement auto-commits; there is no rollback across the two.
    pub fn delete_all(&self) -> Result<(usize, usize)> {
        let conn = self.lock()?;
        let products = conn.execute("DELETE FROM products", [])?;
        let appointments = conn.execute("DELETE FROM appointments", [])?;
        Ok((products, appointments))
    }

    /// Insert a product row from a backup file, without validation
    pub fn insert_backup_product(&self, product: &BackupProduct) -> Result<i64> {
        let conn = self.lock()?;
        let name = product.name.clone().unwrap_or_default();
        conn.query_row(
            "INSERT INTO products (name, qty, unit_price, threshold)
             VALUES (?, ?, ?, ?)
             RETURNING id",
            params![
                product.name,
                product.qty.unwrap_or(0.0),
                product.unit_price.unwrap_or(0.0),
                product.threshold.unwrap_or(0.0),
            ],
            |row| row.get(0),
        )
        .map_err(|e| map_unique_violation(e, &name))
    }

    /// Insert an appointment row from a backup file, without validation
    pub fn insert_backup_appointment(&self, appointment: &BackupAppointment) -> Result<i64> {
        let conn = self.lock()?;
        let id = conn.query_row(
            "INSERT INTO appointments (client, address, datetime, service, price, consumption)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id",
            params![
                appointment.client,
                appointment.address.as_deref().unwrap_or(""),
                appointment.datetime,
                appointment.service.as_deref().unwrap_or(""),
                appointment.price.unwrap_or(0.0),
                appointment.consumption.as_deref().unwrap_or(""),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // === Maintenance ===

    /// Column names of a table, in declaration order
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        SchemaService::new(&conn).table_columns(table)
    }
}

fn map_unique_violation(err: duckdb::Error, name: &str) -> Error {
    if is_unique_violation(&err.to_string()) {
        Error::DuplicateName(name.to_string())
    } else {
        err.into()
    }
}

// Column order follows PRODUCT_COLUMNS. NULLs from imported rows read as defaults.
fn row_to_product(row: &duckdb::Row) -> duckdb::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        qty: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
        unit_price: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
        threshold: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
    })
}

// Column order follows APPOINTMENT_COLUMNS.
fn row_to_appointment(row: &duckdb::Row) -> duckdb::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        client: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        address: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        datetime: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        service: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        price: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
        consumption: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}
