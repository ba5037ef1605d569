//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod appointment;
mod backup;
pub mod consumption;
mod product;
pub mod result;

pub use appointment::{parse_datetime, Appointment, AppointmentInput, DATETIME_FORMAT};
pub use backup::{BackupAppointment, BackupDocument, BackupFile, BackupProduct};
pub use consumption::{parse_consumption, ConsumptionEntry, ConsumptionPlan};
pub use product::{Product, ProductInput};
