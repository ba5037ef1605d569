//! Backup domain model
//!
//! The JSON layout matches the files written by earlier CarPlus releases:
//! ```json
//! {
//!   "exported_at": "2025-03-14T09:30:00+00:00",
//!   "products": [{ "id": 1, "name": "Shampoo", "qty": 4.0, "unit_price": 9.5, "threshold": 1.0 }],
//!   "appointments": [{ "id": 1, "client": "Rossi", "address": "", "datetime": "2025-03-14 09:30",
//!                      "service": "Wash", "price": 30.0, "consumption": "Shampoo:1" }]
//! }
//! ```
//! Import trusts the file, so every field is optional on read.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Appointment, Product};

/// Full dataset snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupDocument {
    #[serde(default, alias = "exportedAt")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub products: Vec<BackupProduct>,
    #[serde(default)]
    pub appointments: Vec<BackupAppointment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupProduct {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupAppointment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub consumption: Option<String>,
}

impl From<&Product> for BackupProduct {
    fn from(p: &Product) -> Self {
        Self {
            id: Some(p.id),
            name: Some(p.name.clone()),
            qty: Some(p.qty),
            unit_price: Some(p.unit_price),
            threshold: Some(p.threshold),
        }
    }
}

impl From<&Appointment> for BackupAppointment {
    fn from(a: &Appointment) -> Self {
        Self {
            id: Some(a.id),
            client: Some(a.client.clone()),
            address: Some(a.address.clone()),
            datetime: Some(a.datetime.clone()),
            service: Some(a.service.clone()),
            price: Some(a.price),
            consumption: Some(a.consumption.clone()),
        }
    }
}

/// A backup file written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFile {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub products: usize,
    pub appointments: usize,
}

impl BackupFile {
    /// Format size for human display
    pub fn size_display(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        if self.size_bytes >= MB {
            format!("{:.1} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.1} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}
