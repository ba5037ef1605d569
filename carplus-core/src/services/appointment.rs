//! Appointment service - bookings and the stock they consume
//!
//! Creating an appointment applies its consumption string to inventory.
//! Editing or deleting one never touches stock again: the edit only rewrites
//! the stored text, and a delete does not give anything back.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::consumption::{parse_consumption, SkippedEntry};
use crate::domain::result::{Error, Result};
use crate::domain::{Appointment, AppointmentInput};

/// Appointment service for booking CRUD
pub struct AppointmentService {
    repository: Arc<DuckDbRepository>,
}

impl AppointmentService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    /// List appointments chronologically, optionally matching client or address
    pub fn list(&self, filter: Option<&str>) -> Result<Vec<Appointment>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        self.repository.get_appointments(filter)
    }

    /// Appointments scheduled at or after `from`, at most `limit`
    pub fn list_upcoming(&self, from: NaiveDateTime, limit: usize) -> Result<Vec<Appointment>> {
        self.repository.get_upcoming_appointments(from, limit)
    }

    pub fn get(&self, id: i64) -> Result<Appointment> {
        self.repository
            .get_appointment_by_id(id)?
            .ok_or_else(|| Error::not_found(format!("Appointment {}", id)))
    }

    /// Book an appointment and apply its consumption to stock
    ///
    /// The insert is committed before consumption is applied. Problems with
    /// the consumption string are logged and otherwise ignored.
    pub fn add(&self, input: &AppointmentInput) -> Result<i64> {
        Ok(self.add_with_report(input)?.id)
    }

    /// Same as [`add`](Self::add), also reporting what consumption did
    pub fn add_with_report(&self, input: &AppointmentInput) -> Result<AddedAppointment> {
        let input = input.normalized();
        input.validate()?;

        let id = self.repository.insert_appointment(&input)?;
        debug!(id, "appointment added");

        let consumption = self.apply_consumption(&input.consumption);
        Ok(AddedAppointment { id, consumption })
    }

    /// Rewrite an appointment. Stock is not recalculated.
    pub fn update(&self, id: i64, input: &AppointmentInput) -> Result<()> {
        let input = input.normalized();
        input.validate()?;

        if self.repository.update_appointment(id, &input)? == 0 {
            return Err(Error::not_found(format!("Appointment {}", id)));
        }
        Ok(())
    }

    /// Delete an appointment. Consumed stock is not restored.
    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self.repository.delete_appointment(id)?;
        debug!(id, deleted, "appointment delete");
        Ok(())
    }

    fn apply_consumption(&self, text: &str) -> ConsumptionReport {
        let plan = parse_consumption(text);
        let mut report = ConsumptionReport {
            skipped: plan.skipped,
            ..Default::default()
        };

        for skipped in &report.skipped {
            debug!(entry = %skipped.raw, reason = ?skipped.reason, "consumption entry skipped");
        }

        for entry in plan.entries {
            match self.repository.decrement_stock(&entry.product, entry.quantity) {
                Ok(true) => report.applied.push(entry.product),
                Ok(false) => report.unknown_products.push(entry.product),
                Err(e) => {
                    warn!(product = %entry.product, error = %e, "failed to apply consumption");
                    report.failed.push(entry.product);
                }
            }
        }

        report
    }
}

/// Result of booking an appointment
#[derive(Debug, Serialize)]
pub struct AddedAppointment {
    pub id: i64,
    pub consumption: ConsumptionReport,
}

/// What happened to each consumption entry
#[derive(Debug, Default, Serialize)]
pub struct ConsumptionReport {
    /// Products whose stock was reduced
    pub applied: Vec<String>,
    /// Names with no matching product
    pub unknown_products: Vec<String>,
    /// Entries the parser could not understand
    pub skipped: Vec<SkippedEntry>,
    /// Products whose update hit a database error
    pub failed: Vec<String>,
}
