//! Appointment domain model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// The only accepted appointment date/time layout (`YYYY-MM-DD HH:MM`)
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A booked detailing job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub client: String,
    pub address: String,
    /// Stored verbatim as entered, see [`DATETIME_FORMAT`]
    pub datetime: String,
    pub service: String,
    pub price: f64,
    /// Raw consumption string, e.g. `Shampoo:1,Wax:0.2`
    pub consumption: String,
}

impl Appointment {
    /// Parsed date/time, `None` for rows that were imported with a bad value
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        parse_datetime(&self.datetime).ok()
    }
}

/// User-supplied fields for creating or editing an appointment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentInput {
    pub client: String,
    pub address: String,
    pub datetime: String,
    pub service: String,
    pub price: f64,
    pub consumption: String,
}

impl AppointmentInput {
    /// Trim every text field the way it is persisted
    pub fn normalized(&self) -> Self {
        Self {
            client: self.client.trim().to_string(),
            address: self.address.trim().to_string(),
            datetime: self.datetime.trim().to_string(),
            service: self.service.trim().to_string(),
            price: self.price,
            consumption: self.consumption.trim().to_string(),
        }
    }

    /// Check required fields, then the date/time layout
    pub fn validate(&self) -> Result<()> {
        if self.client.trim().is_empty() {
            return Err(Error::validation("client is required"));
        }
        if self.datetime.trim().is_empty() {
            return Err(Error::validation("date/time is required"));
        }
        parse_datetime(&self.datetime)?;
        Ok(())
    }
}

/// Parse a `YYYY-MM-DD HH:MM` string
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT)
        .map_err(|_| Error::InvalidDateTime(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(client: &str, datetime: &str) -> AppointmentInput {
        AppointmentInput {
            client: client.to_string(),
            datetime: datetime.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_datetime_accepts_pattern() {
        let dt = parse_datetime("2025-03-14 09:30").unwrap();
        assert_eq!(dt.format(DATETIME_FORMAT).to_string(), "2025-03-14 09:30");
    }

    #[test]
    fn test_parse_datetime_rejects_other_layouts() {
        for bad in [
            "2025-03-14",
            "2025-03-14T09:30",
            "14/03/2025 09:30",
            "2025-03-14 09:30:00",
            "2025-02-30 10:00",
            "2025-03-14 25:00",
            "next tuesday",
        ] {
            assert!(
                matches!(parse_datetime(bad), Err(Error::InvalidDateTime(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_validate_required_fields_first() {
        assert!(matches!(input("", "2025-03-14 09:30").validate(), Err(Error::Validation(_))));
        assert!(matches!(input("Rossi", "  ").validate(), Err(Error::Validation(_))));
        assert!(matches!(input("Rossi", "soon").validate(), Err(Error::InvalidDateTime(_))));
        assert!(input("Rossi", " 2025-03-14 09:30 ").validate().is_ok());
    }

    #[test]
    fn test_normalized_trims() {
        let normalized = AppointmentInput {
            client: "  Rossi ".to_string(),
            address: " Via Roma 1 ".to_string(),
            datetime: " 2025-03-14 09:30".to_string(),
            service: "Full detail ".to_string(),
            price: 80.0,
            consumption: " Shampoo:1 ".to_string(),
        }
        .normalized();

        assert_eq!(normalized.client, "Rossi");
        assert_eq!(normalized.address, "Via Roma 1");
        assert_eq!(normalized.datetime, "2025-03-14 09:30");
        assert_eq!(normalized.service, "Full detail");
        assert_eq!(normalized.consumption, "Shampoo:1");
    }
}
