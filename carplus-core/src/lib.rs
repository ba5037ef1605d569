//! CarPlus Core - inventory and appointments for a mobile car-care business
//!
//! - **domain**: products, appointments, consumption strings, backup documents
//! - **services**: business logic, one service per feature area
//! - **adapters**: the DuckDB repository
//! - **config**: data directory and backup locations

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod services;

use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use config::Config;
use services::*;

pub use domain::result::{Error, Result};
pub use domain::{
    Appointment, AppointmentInput, BackupDocument, BackupFile, Product, ProductInput,
    DATETIME_FORMAT,
};

/// Everything a front end needs, built from one [`Config`]
pub struct CarplusContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    /// What `ensure_schema` did when the context was opened
    pub schema_report: SchemaReport,
    pub product_service: ProductService,
    pub appointment_service: AppointmentService,
    pub stats_service: StatsService,
    pub backup_service: BackupService,
}

impl CarplusContext {
    /// Open the database in `config.data_dir` and bring its schema up to date
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&config.db_path)?);
        let schema_report = repository.ensure_schema()?;

        let product_service = ProductService::new(Arc::clone(&repository));
        let appointment_service = AppointmentService::new(Arc::clone(&repository));
        let stats_service = StatsService::new(Arc::clone(&repository));
        let backup_service = BackupService::new(Arc::clone(&repository), &config);

        Ok(Self {
            config,
            repository,
            schema_report,
            product_service,
            appointment_service,
            stats_service,
            backup_service,
        })
    }
}
