//! Service layer - business logic orchestration
//!
//! Each service owns one feature area and talks to storage through the
//! shared [`DuckDbRepository`](crate::adapters::duckdb::DuckDbRepository).

mod appointment;
mod backup;
pub mod logging;
mod product;
pub mod schema;
mod stats;

pub use appointment::{AddedAppointment, AppointmentService, ConsumptionReport};
pub use backup::{BackupService, ImportResult};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use product::ProductService;
pub use schema::{SchemaReport, SchemaService};
pub use stats::{Dashboard, StatsService, Totals};
