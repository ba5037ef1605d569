//! Stats service - business totals and dashboard summary

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::adapters::duckdb::DuckDbRepository;
use crate::domain::result::Result;
use crate::domain::Appointment;

/// Stats service for aggregate figures
pub struct StatsService {
    repository: Arc<DuckDbRepository>,
}

impl StatsService {
    pub fn new(repository: Arc<DuckDbRepository>) -> Self {
        Self { repository }
    }

    pub fn totals(&self) -> Result<Totals> {
        let (appointment_count, total_revenue) = self.repository.get_appointment_totals()?;
        let product_count = self.repository.get_product_count()?;

        Ok(Totals {
            appointment_count,
            total_revenue,
            product_count,
        })
    }

    /// Most requested service, `None` when nothing is booked
    ///
    /// Ties go to the alphabetically first service name.
    pub fn top_service(&self) -> Result<Option<String>> {
        Ok(self.repository.get_top_service()?.map(|(service, _)| service))
    }

    /// Totals, top service, and the next `limit` appointments from `now`
    pub fn dashboard(&self, now: NaiveDateTime, limit: usize) -> Result<Dashboard> {
        let totals = self.totals()?;
        let top = self.repository.get_top_service()?;
        let upcoming = self.repository.get_upcoming_appointments(now, limit)?;

        Ok(Dashboard {
            totals,
            top_service: top.as_ref().map(|(service, _)| service.clone()),
            top_service_count: top.map(|(_, count)| count).unwrap_or(0),
            upcoming,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub appointment_count: i64,
    pub total_revenue: f64,
    pub product_count: i64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub top_service: Option<String>,
    pub top_service_count: i64,
    pub upcoming: Vec<Appointment>,
}
